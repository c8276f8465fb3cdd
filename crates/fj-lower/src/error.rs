use fj_asm::AsmError;
use fj_ir::Stmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("unsupported {kind}: {detail}")]
    Unsupported { kind: &'static str, detail: String },
    #[error("structural inconsistency: {message}")]
    Structural { message: String },
    #[error("slot allocation failed: {message}")]
    Slot { message: String },
    #[error("assembler rejected method: {0}")]
    Assembler(#[from] AsmError),
    #[error("failed to lower {method}{}: {source}", describe_stmt(.stmt))]
    InMethod {
        method: String,
        stmt: Option<String>,
        #[source]
        source: Box<LowerError>,
    },
}

fn describe_stmt(stmt: &Option<String>) -> String {
    match stmt {
        Some(text) => format!(" at `{}`", text),
        None => String::new(),
    }
}

impl LowerError {
    pub fn unsupported(kind: &'static str, detail: impl Into<String>) -> Self {
        LowerError::Unsupported {
            kind,
            detail: detail.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        LowerError::Structural {
            message: message.into(),
        }
    }

    pub fn slot(message: impl Into<String>) -> Self {
        LowerError::Slot {
            message: message.into(),
        }
    }

    /// Attaches the method name, and the statement if given. Errors that
    /// already carry a method context are returned untouched.
    pub fn in_method(self, method: &str, stmt: Option<&Stmt>) -> Self {
        match self {
            LowerError::InMethod { .. } => self,
            other => LowerError::InMethod {
                method: method.to_string(),
                stmt: stmt.map(|stmt| stmt.kind.to_string()),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with every method wrapper stripped.
    pub fn root(&self) -> &LowerError {
        match self {
            LowerError::InMethod { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = LowerError> = std::result::Result<T, E>;
