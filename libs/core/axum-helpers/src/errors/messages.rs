//! Standard error messages and codes for consistent error responses.

// Message constants
pub const VALIDATION_FAILED: &str = "Request validation failed";
pub const INVALID_ID: &str = "Invalid id: expected a positive integer";
pub const INVALID_JSON: &str = "Invalid JSON body";
pub const NOT_FOUND_RESOURCE: &str = "The requested resource was not found";
pub const BAD_REQUEST: &str = "The request could not be understood";
pub const METHOD_NOT_ALLOWED: &str = "The HTTP method is not allowed for this resource";
pub const INTERNAL_ERROR: &str = "An internal server error occurred";

// Error codes for observability and debugging
pub const CODE_VALIDATION: i32 = 1001;
pub const CODE_INVALID_ID: i32 = 1002;
pub const CODE_JSON_EXTRACTION: i32 = 1003;
pub const CODE_NOT_FOUND: i32 = 1004;
pub const CODE_INTERNAL: i32 = 1005;
pub const CODE_BAD_REQUEST: i32 = 1006;
pub const CODE_METHOD_NOT_ALLOWED: i32 = 1007;
