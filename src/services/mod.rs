pub(crate) mod csv_export;
pub(crate) mod pins;
pub(crate) mod sanitize;
