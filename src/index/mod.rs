/*! Vocabularies used during extraction.

Both are loaded once per run and are immutable afterwards:
workers share them behind an [std::sync::Arc].
!*/
mod keyword;
mod phrases;

pub use keyword::KeywordIndex;
pub use phrases::PhraseVocabulary;
