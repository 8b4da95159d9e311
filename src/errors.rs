use failure::Fail;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    IO(::std::io::Error),
    #[fail(display = "{}", _0)]
    Zip(::zip::result::ZipError),
    #[fail(display = "{}", _0)]
    Bincode(::bincode::Error),
    #[fail(display = "{}", _0)]
    Json(::serde_json::Error),
    #[fail(display = "{}", _0)]
    Malformed(String),
    #[fail(display = "Could not find resource '{}' in any registered file.", _0)]
    NotFound(String),
    #[fail(display = "No loader matches resource '{}'.", _0)]
    NoLoader(String),
    #[fail(display = "Loader pattern '{}' is invalid: {}", _0, _1)]
    InvalidPattern(String, String),
    #[fail(display = "Failed to open resource file '{}': {}", _0, _1)]
    FileOpen(String, String),
    #[fail(display = "Resource file '{}' has been registered already.", _0)]
    DuplicatedFile(String),
    #[fail(display = "Failed to decode resource '{}': {}", name, reason)]
    Decode { name: String, reason: ::failure::Error },
    #[fail(
        display = "Resource '{}' is truncated ({} of {} bytes copied).",
        name, copied, expected
    )]
    ShortRead {
        name: String,
        copied: usize,
        expected: usize,
    },
    #[fail(
        display = "Allocation of {} bytes exceeds the cache capacity of {} bytes.",
        size, capacity
    )]
    TooLarge { size: usize, capacity: usize },
    #[fail(
        display = "Could not make room for {} bytes ({} of {} bytes are pinned).",
        size, allocated, capacity
    )]
    OutOfBudget {
        size: usize,
        allocated: usize,
        capacity: usize,
    },
    #[fail(display = "Circular reference of resource '{}' found!", _0)]
    CircularReference(String),
    #[fail(display = "Loading of resource '{}' failed on another thread.", _0)]
    LoadFailed(String),
    #[fail(display = "Run out of resource slots.")]
    Exhausted,
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        Error::IO(err)
    }
}

impl From<::zip::result::ZipError> for Error {
    fn from(err: ::zip::result::ZipError) -> Self {
        Error::Zip(err)
    }
}

impl From<::bincode::Error> for Error {
    fn from(err: ::bincode::Error) -> Self {
        Error::Bincode(err)
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Self {
        Error::Json(err)
    }
}
