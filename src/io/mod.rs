// Text I/O around the core: ratings input parsing and the tab-delimited
// inter-stage record encodings. The stages themselves never touch text —
// they consume and produce typed values; everything line-shaped lives here.

pub mod ratings;
pub mod records;
