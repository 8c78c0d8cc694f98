//! Numeric ids in the base namespace for the structures this crate defines.
//!
//! Each structure has a data type id plus one id per encoding.

pub const NODE_ATTRIBUTES: u32 = 349;
pub const NODE_ATTRIBUTES_ENCODING_XML: u32 = 350;
pub const NODE_ATTRIBUTES_ENCODING_BINARY: u32 = 351;

pub const METHOD_ATTRIBUTES: u32 = 358;
pub const METHOD_ATTRIBUTES_ENCODING_XML: u32 = 359;
pub const METHOD_ATTRIBUTES_ENCODING_BINARY: u32 = 360;

pub const REFERENCE_TYPE_ATTRIBUTES: u32 = 367;
pub const REFERENCE_TYPE_ATTRIBUTES_ENCODING_XML: u32 = 368;
pub const REFERENCE_TYPE_ATTRIBUTES_ENCODING_BINARY: u32 = 369;

pub const VIEW_ATTRIBUTES: u32 = 373;
pub const VIEW_ATTRIBUTES_ENCODING_XML: u32 = 374;
pub const VIEW_ATTRIBUTES_ENCODING_BINARY: u32 = 375;

pub const USER_TOKEN_POLICY: u32 = 304;
pub const USER_TOKEN_POLICY_ENCODING_XML: u32 = 305;
pub const USER_TOKEN_POLICY_ENCODING_BINARY: u32 = 306;

pub const APPLICATION_DESCRIPTION: u32 = 308;
pub const APPLICATION_DESCRIPTION_ENCODING_XML: u32 = 309;
pub const APPLICATION_DESCRIPTION_ENCODING_BINARY: u32 = 310;

pub const ENDPOINT_DESCRIPTION: u32 = 312;
pub const ENDPOINT_DESCRIPTION_ENCODING_XML: u32 = 313;
pub const ENDPOINT_DESCRIPTION_ENCODING_BINARY: u32 = 314;

pub const ENDPOINT_CONFIGURATION: u32 = 331;
pub const ENDPOINT_CONFIGURATION_ENCODING_XML: u32 = 332;
pub const ENDPOINT_CONFIGURATION_ENCODING_BINARY: u32 = 333;

pub const SIGNED_SOFTWARE_CERTIFICATE: u32 = 344;
pub const SIGNED_SOFTWARE_CERTIFICATE_ENCODING_XML: u32 = 345;
pub const SIGNED_SOFTWARE_CERTIFICATE_ENCODING_BINARY: u32 = 346;

pub const REQUEST_HEADER: u32 = 389;
pub const REQUEST_HEADER_ENCODING_XML: u32 = 390;
pub const REQUEST_HEADER_ENCODING_BINARY: u32 = 391;

pub const RESPONSE_HEADER: u32 = 392;
pub const RESPONSE_HEADER_ENCODING_XML: u32 = 393;
pub const RESPONSE_HEADER_ENCODING_BINARY: u32 = 394;

pub const GET_ENDPOINTS_REQUEST: u32 = 426;
pub const GET_ENDPOINTS_REQUEST_ENCODING_XML: u32 = 427;
pub const GET_ENDPOINTS_REQUEST_ENCODING_BINARY: u32 = 428;

pub const GET_ENDPOINTS_RESPONSE: u32 = 429;
pub const GET_ENDPOINTS_RESPONSE_ENCODING_XML: u32 = 430;
pub const GET_ENDPOINTS_RESPONSE_ENCODING_BINARY: u32 = 431;

pub const BROWSE_DESCRIPTION: u32 = 514;
pub const BROWSE_DESCRIPTION_ENCODING_XML: u32 = 515;
pub const BROWSE_DESCRIPTION_ENCODING_BINARY: u32 = 516;

pub const DISCOVERY_CONFIGURATION: u32 = 12890;
pub const DISCOVERY_CONFIGURATION_ENCODING_XML: u32 = 12896;
pub const DISCOVERY_CONFIGURATION_ENCODING_BINARY: u32 = 12900;

pub const MDNS_DISCOVERY_CONFIGURATION: u32 = 12891;
pub const MDNS_DISCOVERY_CONFIGURATION_ENCODING_XML: u32 = 12897;
pub const MDNS_DISCOVERY_CONFIGURATION_ENCODING_BINARY: u32 = 12901;

/// Abstract base of all structures.
pub const STRUCTURE: u32 = 22;
