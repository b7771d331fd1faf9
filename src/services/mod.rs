pub(crate) mod answer_store;
pub(crate) mod countdown;
pub(crate) mod notifications;
pub(crate) mod scoring;
pub(crate) mod session;
