//! Storage-qualifier spelling tables, one per shader stage, matching the
//! original's `mode[3][6]` spelling array.

use glopt_core::frontend::ShaderStage;
use glopt_core::ir::StorageQualifier;

/// Which spelling table a variable should use: the stage's table for a
/// top-level declaration, or the generic table for a function parameter
/// (parameters never carry stage-specific keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierContext {
    Stage(ShaderStage),
    Parameter,
}

pub fn spelling(ctx: QualifierContext, storage: StorageQualifier) -> &'static str {
    match ctx {
        QualifierContext::Parameter => generic(storage),
        QualifierContext::Stage(ShaderStage::Vertex) => vertex(storage),
        QualifierContext::Stage(ShaderStage::Fragment) => fragment(storage),
    }
}

fn generic(storage: StorageQualifier) -> &'static str {
    match storage {
        StorageQualifier::Auto | StorageQualifier::Temporary => "",
        StorageQualifier::Uniform => "uniform ",
        StorageQualifier::In => "in ",
        StorageQualifier::Out => "out ",
        StorageQualifier::Inout => "inout ",
    }
}

fn vertex(storage: StorageQualifier) -> &'static str {
    match storage {
        StorageQualifier::Auto | StorageQualifier::Temporary => "",
        StorageQualifier::Uniform => "uniform ",
        StorageQualifier::In => "attribute ",
        StorageQualifier::Out => "varying ",
        StorageQualifier::Inout => "inout ",
    }
}

fn fragment(storage: StorageQualifier) -> &'static str {
    match storage {
        StorageQualifier::Auto | StorageQualifier::Temporary => "",
        StorageQualifier::Uniform => "uniform ",
        StorageQualifier::In => "varying ",
        StorageQualifier::Out => "out ",
        StorageQualifier::Inout => "inout ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_in_is_attribute() {
        assert_eq!(spelling(QualifierContext::Stage(ShaderStage::Vertex), StorageQualifier::In), "attribute ");
    }

    #[test]
    fn fragment_in_is_varying() {
        assert_eq!(spelling(QualifierContext::Stage(ShaderStage::Fragment), StorageQualifier::In), "varying ");
    }

    #[test]
    fn parameters_never_emit_stage_keywords() {
        assert_eq!(spelling(QualifierContext::Parameter, StorageQualifier::In), "in ");
        assert_eq!(spelling(QualifierContext::Parameter, StorageQualifier::Out), "out ");
    }
}
