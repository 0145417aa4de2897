/// Collector for non-fatal diagnostics emitted while reading a file.
///
/// Messages go both to the `log` facade and into an in-memory list the
/// caller can show in an error console afterwards. A context string (cave
/// name, line number) is prefixed to every message while it is set.
#[derive(Default, Debug)]
pub struct Reporter {
    context: Option<String>,
    messages: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = Some(context.into());
    }

    pub fn clear_context(&mut self) {
        self.context = None;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        let message = match &self.context {
            Some(c) => format!("{c}: {message}"),
            None => message,
        };
        log::warn!("{message}");
        self.messages.push(message);
    }

    /// True if any diagnostic was emitted since the last `take`.
    pub fn had_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Drain the accumulated messages.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}
