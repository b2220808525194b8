// quire-common: shared types and codecs for the quire workspace

pub mod frontmatter;
pub mod id;
pub mod path;
pub mod types;
