pub(crate) mod exam;
pub(crate) mod result;
