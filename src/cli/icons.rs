//! Status markers printed in front of CLI messages.

use std::fmt;

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Done,
    Step,
    Warn,
    Fail,
    /// Indented detail under a previous line.
    Detail,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled = match self {
            Icon::Done => style("✓").green(),
            Icon::Step => style("→").cyan(),
            Icon::Warn => style("!").yellow(),
            Icon::Fail => style("✗").red(),
            Icon::Detail => style("→").dim(),
        };
        write!(f, "{}", styled)
    }
}
