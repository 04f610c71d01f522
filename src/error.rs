use crate::grid::{COLS, ROWS};

pub type GlowgridResult<T> = Result<T, GlowgridError>;

#[derive(thiserror::Error, Debug)]
pub enum GlowgridError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("library error: {0}")]
    Library(String),

    #[error("matrix is {expected_rows}x{expected_cols} but the file declares {rows}x{cols}")]
    GeometryMismatch {
        rows: u32,
        cols: u32,
        expected_rows: u32,
        expected_cols: u32,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlowgridError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn library(msg: impl Into<String>) -> Self {
        Self::Library(msg.into())
    }

    pub fn geometry_mismatch(rows: u32, cols: u32) -> Self {
        Self::GeometryMismatch {
            rows,
            cols,
            expected_rows: ROWS as u32,
            expected_cols: COLS as u32,
        }
    }
}
