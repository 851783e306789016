//! Constants used in DICOMweb data address properties

/// Data address type handled by the DICOMweb source and sink
pub const TYPE: &str = "DicomWebData";

/// Transfer type for pushing DICOMweb data to a consumer
pub const TRANSFERTYPE_PUSH: &str = "DicomWebData-PUSH";

/// WADO-RS endpoint for sources, STOW-RS endpoint for sinks
pub const URL: &str = "url";

pub const USERNAME: &str = "username";

pub const PASSWORD: &str = "password";

/// Vault key holding the password when `password` is not set on the address
pub const SECRET_NAME: &str = "secretName";

/// Name given to the parts of a source
pub const NAME: &str = "name";

pub const DEFAULT_SOURCE_NAME: &str = "DicomWebDataSource";

pub const DICOM_MEDIA_TYPE: &str = "application/dicom";
