use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("can't read program {path:?}")]
    Rom { path: PathBuf, source: io::Error },

    #[error("terminal i/o failed")]
    Terminal(#[from] io::Error),

    #[error(transparent)]
    Vm(#[from] chip8_vm::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
