//! Peak bookkeeping shared by the scan kernels and the locator.

pub(crate) mod nms;
pub(crate) mod topk;
