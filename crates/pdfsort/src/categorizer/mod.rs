pub mod matcher;

pub use matcher::{
    Categorizer, Classification, KeywordSet, UnsortableReason, BUILTIN_DESIRED_KEYWORDS,
    DEFAULT_KEYWORDS, DEFAULT_UNDESIRED_KEYWORDS,
};
