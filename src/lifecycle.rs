#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    SessionSetup,
    InputChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub trait ListenerRegistry {
    fn add_listener(&mut self, hook: Hook) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

#[derive(Debug, Default)]
pub struct ListenerTable {
    next_id: u64,
    entries: Vec<(ListenerId, Hook)>,
}

impl ListenerTable {
    pub fn is_listening(&self, hook: Hook) -> bool {
        self.entries.iter().any(|(_, h)| *h == hook)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl ListenerRegistry for ListenerTable {
    fn add_listener(&mut self, hook: Hook) -> ListenerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = ListenerId(self.next_id);
        self.entries.push((id, hook));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }
}

const HOOKS: [Hook; 2] = [Hook::SessionSetup, Hook::InputChanged];

/// Owns the listeners that keep input and candidates in tandem. `start` and
/// `stop` are exact inverses.
#[derive(Debug, Default)]
pub struct Lifecycle {
    registered: Vec<ListenerId>,
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        !self.registered.is_empty()
    }

    pub fn start(&mut self, registry: &mut impl ListenerRegistry) -> bool {
        if self.is_active() {
            return false;
        }
        self.registered = HOOKS
            .iter()
            .map(|hook| registry.add_listener(*hook))
            .collect();
        tracing::info!(listeners = self.registered.len(), "tandem mode started");
        true
    }

    pub fn stop(&mut self, registry: &mut impl ListenerRegistry) -> bool {
        if !self.is_active() {
            return false;
        }
        for id in self.registered.drain(..) {
            registry.remove_listener(id);
        }
        tracing::info!("tandem mode stopped");
        true
    }
}
