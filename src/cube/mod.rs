pub(crate) mod fits;
pub(crate) mod model;
pub(crate) mod reduce;
