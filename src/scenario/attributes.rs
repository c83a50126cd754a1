//! The attribute-cell arena and its change listeners.

use std::fmt;
use std::rc::Rc;

use crate::rules::{Action, ValueConstraint};

/// A handle to one attribute cell.
///
/// Handles are minted during compilation and stay valid for the lifetime of
/// the scenario they were compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeId(usize);

impl AttributeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of this cell within the scenario's attribute arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to one listener in the scenario's listener arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListenerId(usize);

impl ListenerId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

/// When a listener fires relative to its constraint being met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerPolicy {
    /// Fires on the first met check and never again.
    Once,
    /// Fires on every met check.
    Every,
    /// Fires on each unmet-to-met transition.
    Intermittent,
}

impl TriggerPolicy {
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "once" => Some(TriggerPolicy::Once),
            "every" => Some(TriggerPolicy::Every),
            "intermittent" => Some(TriggerPolicy::Intermittent),
            _ => None,
        }
    }
}

/// A compiled attribute listener.
///
/// Listeners are notified on every write to their cell, whether or not the
/// stored number changed; the policy decides which notifications turn into
/// action runs.
#[derive(Debug, Clone)]
pub(crate) struct Listener {
    priority: i64,
    constraint: Rc<ValueConstraint>,
    policy: TriggerPolicy,
    actions: Rc<[Action]>,
    fired: bool,
    was_meeting: bool,
}

impl Listener {
    pub(crate) fn new(
        priority: i64,
        constraint: Rc<ValueConstraint>,
        policy: TriggerPolicy,
        actions: Rc<[Action]>,
    ) -> Self {
        Self {
            priority,
            constraint,
            policy,
            actions,
            fired: false,
            was_meeting: false,
        }
    }

    pub(crate) const fn priority(&self) -> i64 {
        self.priority
    }

    pub(crate) fn constraint(&self) -> Rc<ValueConstraint> {
        Rc::clone(&self.constraint)
    }

    pub(crate) fn actions(&self) -> Rc<[Action]> {
        Rc::clone(&self.actions)
    }

    /// Record one constraint check and decide whether the listener fires.
    pub(crate) fn note(&mut self, meets: bool) -> bool {
        match self.policy {
            TriggerPolicy::Once => {
                if meets && !self.fired {
                    self.fired = true;
                    true
                } else {
                    false
                }
            }
            TriggerPolicy::Every => meets,
            TriggerPolicy::Intermittent => {
                let fire = meets && !self.was_meeting;
                self.was_meeting = meets;
                fire
            }
        }
    }
}

/// One attribute cell: a value plus its write behaviour.
#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    value: f64,
    readonly: bool,
    constraints: Rc<[ValueConstraint]>,
    listeners: Vec<ListenerId>,
}

impl Attribute {
    /// A cell holding its declared initial value.
    ///
    /// The initial value is stored as written; constraints apply to later
    /// writes only.
    pub(crate) fn new(value: f64, readonly: bool) -> Self {
        Self {
            value,
            readonly,
            constraints: Rc::from([]),
            listeners: Vec::new(),
        }
    }

    pub(crate) const fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn set_raw(&mut self, value: f64) {
        self.value = value;
    }

    pub(crate) const fn readonly(&self) -> bool {
        self.readonly
    }

    pub(crate) fn constraints(&self) -> Rc<[ValueConstraint]> {
        Rc::clone(&self.constraints)
    }

    pub(crate) fn set_constraints(&mut self, constraints: Rc<[ValueConstraint]>) {
        self.constraints = constraints;
    }

    pub(crate) fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }

    pub(crate) fn attach_listener(&mut self, id: ListenerId) {
        self.listeners.push(id);
    }

    /// Order the attached listeners by dispatch priority.
    ///
    /// The sort is stable, so equal priorities keep declaration order.
    pub(crate) fn sort_listeners(&mut self, arena: &[Listener]) {
        self.listeners
            .sort_by_key(|id| arena.get(id.index()).map_or(0, Listener::priority));
    }
}

/// The scenario's attribute arena.
#[derive(Debug, Clone, Default)]
pub(crate) struct Attributes {
    cells: Vec<Attribute>,
}

impl Attributes {
    pub(crate) fn alloc(&mut self, cell: Attribute) -> AttributeId {
        self.cells.push(cell);
        AttributeId::new(self.cells.len() - 1)
    }

    pub(crate) fn get(&self, id: AttributeId) -> Option<&Attribute> {
        self.cells.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: AttributeId) -> Option<&mut Attribute> {
        self.cells.get_mut(id.index())
    }

    pub(crate) fn value(&self, id: AttributeId) -> Option<f64> {
        self.get(id).map(Attribute::value)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn sort_all_listeners(&mut self, arena: &[Listener]) {
        for cell in &mut self.cells {
            cell.sort_listeners(arena);
        }
    }
}
