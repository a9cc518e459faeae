pub(crate) mod blur;
pub(crate) mod chain;
pub(crate) mod composite;
pub(crate) mod params;
