//! The uniform `{code, message, data}` response envelope.
//!
//! Servers in this family report logical success/failure inside a 200
//! response; the envelope code is authoritative, not the HTTP status.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Server response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Logical status code, compared against the configured success code.
    pub code: i64,

    /// Server-supplied human-readable message.
    #[serde(default)]
    pub message: String,

    /// Payload; absent on pure-acknowledgement responses.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning a non-success code into a business error
    /// even though the transport reported success.
    pub fn into_data(self, success_code: i64) -> ApiResult<T> {
        if self.code != success_code {
            return Err(ApiError::Business {
                code: self.code,
                message: if self.message.is_empty() {
                    "the request failed".to_string()
                } else {
                    self.message
                },
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode("envelope carried no data".to_string()))
    }

    /// Like `into_data`, but a missing payload on success is fine.
    pub fn into_optional(self, success_code: i64) -> ApiResult<Option<T>> {
        if self.code != success_code {
            return Err(ApiError::Business {
                code: self.code,
                message: if self.message.is_empty() {
                    "the request failed".to_string()
                } else {
                    self.message
                },
            });
        }
        Ok(self.data)
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Number of pages the full listing spans.
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Query parameters for requesting one page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageQuery {
    pub(crate) fn to_query(self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ]
    }
}
