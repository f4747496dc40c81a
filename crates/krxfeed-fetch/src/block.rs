//! Backend report routines (`bld` descriptors).
//!
//! Every data request names the routine that serves it. The response wraps the
//! rows in a block whose key is routine-specific and has to be known up front.

use std::borrow::Cow;

/// How the data endpoint answers a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseKind {
    /// `application/json` envelope from `getJsonData.cmd`.
    #[default]
    Json,
    /// Raw XLS/XML bytes from the file download endpoint.
    Binary,
}

/// A backend report routine and the shape of its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    bld: Cow<'static, str>,
    output: Cow<'static, str>,
    fields: &'static [&'static str],
    kind: ResponseKind,
}

impl Descriptor {
    /// Creates a JSON routine descriptor.
    ///
    /// `fields` lists the fields every row must carry; the parser rejects rows
    /// missing any of them.
    #[must_use]
    pub const fn new(
        bld: &'static str,
        output: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            bld: Cow::Borrowed(bld),
            output: Cow::Borrowed(output),
            fields,
            kind: ResponseKind::Json,
        }
    }

    /// Creates a descriptor for a routine only known at runtime, with no required fields.
    #[must_use]
    pub fn custom(bld: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            bld: Cow::Owned(bld.into()),
            output: Cow::Owned(output.into()),
            fields: &[],
            kind: ResponseKind::Json,
        }
    }

    /// Switches the descriptor to a binary download routine.
    #[must_use]
    pub fn binary(mut self) -> Self {
        self.kind = ResponseKind::Binary;
        self
    }

    /// Returns the routine identifier sent as `bld`.
    #[must_use]
    pub fn bld(&self) -> &str {
        &self.bld
    }

    /// Returns the envelope key holding the rows.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the fields every row must carry.
    #[must_use]
    pub const fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Returns the response kind.
    #[must_use]
    pub const fn kind(&self) -> ResponseKind {
        self.kind
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.bld, self.output)
    }
}

/// Finder for securities currently listed on any board.
///
/// Parameters: `mktsel` (`ALL`, `STK`, `KSQ`, `KNX`), `searchText`.
pub const LISTED_FINDER: Descriptor = Descriptor::new(
    "dbms/comm/finder/finder_stkisu",
    "block1",
    &["full_code", "short_code", "codeName", "marketCode"],
);

/// Finder for every security ever delisted.
///
/// Same parameters as [`LISTED_FINDER`]. Rows also carry the delisting date
/// as `delist_dd`, which is optional per row.
pub const DELISTED_FINDER: Descriptor = Descriptor::new(
    "dbms/comm/finder/finder_listdelisu",
    "block1",
    &["full_code", "short_code", "codeName", "marketCode"],
);

/// Daily OHLCV of one index.
///
/// Parameters: `indIdx` (index family), `indIdx2` (index number), `strtDd`, `endDd`.
pub const INDEX_OHLCV: Descriptor = Descriptor::new(
    "dbms/MDC/STAT/standard/MDCSTAT00301",
    "output",
    &["TRD_DD", "CLSPRC_IDX"],
);
