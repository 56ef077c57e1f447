//! Embeddable `create_context`/`optimize`/`Shader` API tying the parse,
//! validate, optimize, and print stages together into one call.
//!
//! There is no `destroy_context`/`delete_shader` function: `Context` and
//! `Shader` are ordinary owned values, so dropping them frees everything
//! ownership already tracks. `Context` does retain one piece of
//! process-wide-feeling state, the type registry, exactly as the
//! original's type tables lived for the process's lifetime; here it
//! simply lives as long as the `Context` value does.

use glopt_core::frontend::{FrontEnd, ParseState, ShaderStage};
use glopt_core::validator;
use glopt_core::{Arena, InstrList, TypeRegistry};
use glopt_passes::DriverConfig;

/// Configuration accepted by [`Context::optimize`], mirroring the split
/// between input configuration and output report the teacher's codegen
/// layer uses for its own `CompileOptions`/`CompileResult` pair.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Runs the structural validator before and after the optimization
    /// driver. Debug builds should leave this on; it is not required
    /// for correctness on HIR this crate itself produced and validated
    /// once already.
    pub validate: bool,
    pub driver: DriverConfig,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { validate: true, driver: DriverConfig::default() }
    }
}

/// The result of one `optimize` call.
#[derive(Debug, Clone, Default)]
pub struct Shader {
    pub status: bool,
    pub raw_output: String,
    pub optimized_output: String,
    pub log: String,
}

pub struct Context {
    reg: TypeRegistry,
    options: CompileOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Context { reg: TypeRegistry::new(), options: CompileOptions::default() }
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Context { reg: TypeRegistry::new(), options }
    }

    /// Parses `source` as `stage` via `front_end`, lowers it to HIR,
    /// validates and prints it both before and after running the
    /// fixed-point optimization driver.
    ///
    /// On a lexer/parser error, skips HIR construction and optimization
    /// entirely and returns `status=false` with the accumulated log, per
    /// the "no throwing path" contract: every failure is a status flag
    /// plus a log, never a panic.
    pub fn optimize<F: FrontEnd>(&mut self, front_end: &F, stage: ShaderStage, source: &str) -> Shader {
        let mut state = front_end.parse_state(stage);
        front_end.lexer_ctor(&mut state, source);
        front_end.parse(&mut state);
        front_end.lexer_dtor(&mut state);

        if state.error() {
            return Shader { status: false, log: state.info_log().to_string(), ..Shader::default() };
        }

        let mut arena = Arena::new();
        let mut list = InstrList::new();
        front_end.ast_to_hir(&state, &mut arena, &mut list);

        self.run_pipeline(stage, arena, list, state.info_log().to_string())
    }

    /// Runs the same validate/print/optimize/print pipeline directly
    /// over an already-built HIR tree, bypassing the front end. Used by
    /// this repository's own tests (via `DirectBuilder`) and by the
    /// CLI's `--from-ir` debug path.
    pub fn optimize_hir(&mut self, stage: ShaderStage, arena: Arena, list: InstrList) -> Shader {
        self.run_pipeline(stage, arena, list, String::new())
    }

    #[tracing::instrument(skip(self, arena, list, log), fields(stage = ?stage))]
    fn run_pipeline(&mut self, stage: ShaderStage, mut arena: Arena, mut list: InstrList, log: String) -> Shader {
        if self.options.validate {
            if let Err(e) = validator::validate(&list, &arena, &mut self.reg) {
                tracing::warn!(error = %e, "pre-optimization validation failed");
                return Shader { status: false, log: append(&log, &e.to_string()), ..Shader::default() };
            }
        }

        let raw_output = match glopt_print::print_program(&list, &arena, &self.reg, stage) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "raw print failed");
                return Shader { status: false, log: append(&log, &e.to_string()), ..Shader::default() };
            }
        };

        glopt_passes::optimize(&mut list, &mut arena, &mut self.reg, self.options.driver);

        if self.options.validate {
            if let Err(e) = validator::validate(&list, &arena, &mut self.reg) {
                tracing::warn!(error = %e, "post-optimization validation failed");
                return Shader {
                    status: false,
                    raw_output,
                    log: append(&log, &e.to_string()),
                    ..Shader::default()
                };
            }
        }

        let optimized_output = match glopt_print::print_program(&list, &arena, &self.reg, stage) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "optimized print failed");
                return Shader {
                    status: false,
                    raw_output,
                    log: append(&log, &e.to_string()),
                    ..Shader::default()
                }
            }
        };

        tracing::debug!("shader compiled successfully");
        Shader { status: true, raw_output, optimized_output, log }
    }
}

fn append(log: &str, message: &str) -> String {
    if log.is_empty() {
        message.to_string()
    } else {
        format!("{}\n{}", log, message)
    }
}
