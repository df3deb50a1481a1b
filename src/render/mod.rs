pub(crate) mod backend;
pub(crate) mod colormap;
pub(crate) mod cpu;
pub(crate) mod layout;
pub(crate) mod slice;
pub(crate) mod text;
