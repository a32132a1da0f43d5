/// Explicit event-subscription table: `[element_id, event, action]` rows.
///
/// Each component builds its table once at initialization. The platform layer
/// walks the rows to attach listeners and routes each DOM event back to the
/// component's `action` value, so components never hold listener closures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription<A> {
    pub element_id: &'static str,
    pub event: &'static str,
    pub action: A,
}

#[derive(Debug, Clone)]
pub struct SubscriptionTable<A> {
    rows: Vec<Subscription<A>>,
}

impl<A> Default for SubscriptionTable<A> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<A: Copy + PartialEq> SubscriptionTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, element_id: &'static str, event: &'static str, action: A) -> Self {
        self.push(element_id, event, action);
        self
    }

    pub fn push(&mut self, element_id: &'static str, event: &'static str, action: A) {
        self.rows.push(Subscription {
            element_id,
            event,
            action,
        });
    }

    pub fn rows(&self) -> &[Subscription<A>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First matching row wins; rows keep insertion order.
    pub fn lookup(&self, element_id: &str, event: &str) -> Option<A> {
        self.rows
            .iter()
            .find(|r| r.element_id == element_id && r.event == event)
            .map(|r| r.action)
    }

    pub fn element_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = Vec::new();
        for row in &self.rows {
            if !ids.contains(&row.element_id) {
                ids.push(row.element_id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionTable;

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Action {
        Open,
        Close,
        Submit,
    }

    #[test]
    fn lookup_routes_by_element_and_event() {
        let table = SubscriptionTable::new()
            .on("bell", "click", Action::Open)
            .on("close", "click", Action::Close)
            .on("form", "submit", Action::Submit);
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("bell", "click"), Some(Action::Open));
        assert_eq!(table.lookup("form", "submit"), Some(Action::Submit));
        assert_eq!(table.lookup("form", "click"), None);
    }

    #[test]
    fn duplicate_rows_resolve_to_first() {
        let table = SubscriptionTable::new()
            .on("x", "click", Action::Open)
            .on("x", "click", Action::Close);
        assert_eq!(table.lookup("x", "click"), Some(Action::Open));
        assert_eq!(table.element_ids(), vec!["x"]);
    }
}
