//! Strategy definition: ordered buy and sell condition lists.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub buy_conditions: Vec<String>,
    pub sell_conditions: Vec<String>,
}

impl Strategy {
    pub fn new(name: impl Into<String>) -> Self {
        Strategy {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Strategy {
            description: description.into(),
            ..self.clone()
        }
    }

    /// Return a copy with `condition` appended to the buy group.
    pub fn with_buy(&self, condition: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.buy_conditions.push(condition.into());
        next
    }

    /// Return a copy with `condition` appended to the sell group.
    pub fn with_sell(&self, condition: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.sell_conditions.push(condition.into());
        next
    }

    /// Return a copy without the first buy condition equal to `condition`.
    pub fn without_buy(&self, condition: &str) -> Self {
        let mut next = self.clone();
        remove_first(&mut next.buy_conditions, condition);
        next
    }

    /// Return a copy without the first sell condition equal to `condition`.
    pub fn without_sell(&self, condition: &str) -> Self {
        let mut next = self.clone();
        remove_first(&mut next.sell_conditions, condition);
        next
    }
}

/// Split a `,`-separated condition list, dropping blank entries.
pub fn split_conditions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

fn remove_first(conditions: &mut Vec<String>, condition: &str) {
    if let Some(idx) = conditions.iter().position(|c| c == condition) {
        conditions.remove(idx);
    }
}
