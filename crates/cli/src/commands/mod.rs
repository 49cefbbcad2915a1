pub(crate) mod check;
pub(crate) mod parse;
pub(crate) mod tokens;
