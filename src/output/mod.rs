// Output formatting — terminal display of run summaries and evaluation
// reports.

pub mod terminal;
