//! Type-directed pretty printer that re-emits shader IR as source text.

pub mod printer;
pub mod qualifiers;

pub use printer::print_program;
