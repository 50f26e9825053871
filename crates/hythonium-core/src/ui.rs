//! Window chrome seam

/// What the shell needs from the UI toolkit.
///
/// Calls arrive on the dispatch thread, one at a time.
pub trait ShellUi {
    /// Replace the address bar text
    fn set_address_bar(&self, text: &str);

    /// A tab was added to the strip and focused
    fn tab_opened(&self, tab_id: &str, title: &str);

    fn tab_closed(&self, tab_id: &str);

    fn set_tab_title(&self, tab_id: &str, title: &str);

    /// Transient text in the status area
    fn show_status(&self, text: &str);

    /// Blocking informational notice
    fn notify_info(&self, title: &str, message: &str);

    /// Blocking warning notice
    fn notify_warning(&self, title: &str, message: &str);

    /// Yes/no question. `false` when the user declines or dismisses it.
    fn confirm(&self, title: &str, question: &str) -> bool;
}
