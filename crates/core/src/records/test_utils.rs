
#[cfg(test)]
pub(crate) use tests::*;
