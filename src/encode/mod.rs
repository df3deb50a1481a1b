pub(crate) mod assembler;
pub(crate) mod backend;
pub(crate) mod ffmpeg;
