use crate::value::ObjectIndex;

/// Anything that addresses one owner object.
pub trait ProxyHandle {
    fn index(&self) -> ObjectIndex;
}

/// Live proxies in creation order with an explicit "current" pointer.
#[derive(Debug)]
pub struct ProxyContainer<P> {
    items: Vec<P>,
    current: Option<ObjectIndex>,
}

impl<P> Default for ProxyContainer<P> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
        }
    }
}

impl<P: ProxyHandle> ProxyContainer<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `item` and makes it current.
    pub fn push(&mut self, item: P) -> &P {
        self.current = Some(item.index());
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub fn get(&self, index: ObjectIndex) -> Option<&P> {
        self.items.iter().find(|item| item.index() == index)
    }

    pub fn current(&self) -> Option<&P> {
        self.current.and_then(|index| self.get(index))
    }

    pub fn current_index(&self) -> Option<ObjectIndex> {
        self.current
    }

    /// Returns `false` and leaves `current` untouched if `index` is unknown.
    pub fn set_current(&mut self, index: ObjectIndex) -> bool {
        if self.get(index).is_none() {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Removes the proxy; if it was current, the newest remaining one
    /// becomes current.
    pub fn remove(&mut self, index: ObjectIndex) -> Option<P> {
        let position = self.items.iter().position(|item| item.index() == index)?;
        let item = self.items.remove(position);
        if self.current == Some(index) {
            self.current = self.items.last().map(ProxyHandle::index);
        }
        Some(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.items.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = P> + '_ {
        self.current = None;
        self.items.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::{ProxyContainer, ProxyHandle};
    use crate::value::ObjectIndex;

    #[derive(Debug, PartialEq)]
    struct Handle(u64);

    impl ProxyHandle for Handle {
        fn index(&self) -> ObjectIndex {
            ObjectIndex(self.0)
        }
    }

    #[test]
    fn push_makes_newest_current() {
        let mut container = ProxyContainer::new();
        container.push(Handle(0));
        container.push(Handle(1));
        assert_eq!(container.current(), Some(&Handle(1)));
        assert!(container.set_current(ObjectIndex(0)));
        assert_eq!(container.current(), Some(&Handle(0)));
        assert!(!container.set_current(ObjectIndex(7)));
        assert_eq!(container.current_index(), Some(ObjectIndex(0)));
    }

    #[test]
    fn removing_current_falls_back_to_newest() {
        let mut container = ProxyContainer::new();
        for index in 0..3 {
            container.push(Handle(index));
        }
        container.set_current(ObjectIndex(1));
        assert_eq!(container.remove(ObjectIndex(1)), Some(Handle(1)));
        assert_eq!(container.current(), Some(&Handle(2)));
        assert_eq!(container.remove(ObjectIndex(1)), None);
        container.remove(ObjectIndex(0));
        container.remove(ObjectIndex(2));
        assert!(container.current().is_none());
        assert!(container.is_empty());
    }
}
