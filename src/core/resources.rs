//! Rune economy: domains, resource pools and costs

use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Resource colors. Enumeration order is the deterministic tie-break order
/// for power payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    #[serde(alias = "fury", alias = "FURY")]
    Fury,
    #[serde(alias = "calm", alias = "CALM")]
    Calm,
    #[serde(alias = "mind", alias = "MIND")]
    Mind,
    #[serde(alias = "body", alias = "BODY")]
    Body,
    #[serde(alias = "chaos", alias = "CHAOS")]
    Chaos,
    #[serde(alias = "order", alias = "ORDER")]
    Order,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Fury,
        Domain::Calm,
        Domain::Mind,
        Domain::Body,
        Domain::Chaos,
        Domain::Order,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Domain> {
        Domain::ALL.get(idx).copied()
    }

    pub fn from_name(name: &str) -> Option<Domain> {
        match name.trim().to_lowercase().as_str() {
            "fury" | "red" => Some(Domain::Fury),
            "calm" | "green" => Some(Domain::Calm),
            "mind" | "blue" => Some(Domain::Mind),
            "body" | "orange" => Some(Domain::Body),
            "chaos" | "purple" => Some(Domain::Chaos),
            "order" | "yellow" => Some(Domain::Order),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::Fury => "Fury",
            Domain::Calm => "Calm",
            Domain::Mind => "Mind",
            Domain::Body => "Body",
            Domain::Chaos => "Chaos",
            Domain::Order => "Order",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A set of domains packed into a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSet(u8);

impl DomainSet {
    pub const fn empty() -> Self {
        DomainSet(0)
    }

    pub const fn all() -> Self {
        DomainSet(0b11_1111)
    }

    pub fn single(domain: Domain) -> Self {
        DomainSet(1 << domain.index())
    }

    pub fn insert(&mut self, domain: Domain) {
        self.0 |= 1 << domain.index();
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.0 & (1 << domain.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Domains in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = Domain> + '_ {
        Domain::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// An empty set places no restriction
    pub fn or_all(self) -> Self {
        if self.is_empty() {
            DomainSet::all()
        } else {
            self
        }
    }
}

impl FromIterator<Domain> for DomainSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        let mut set = DomainSet::empty();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

/// Which domains may pay an add-on power requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerKind {
    /// Exactly this domain
    Specific(Domain),
    /// Any domain of the card being paid for
    Matching,
    /// Any domain at all
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRequirement {
    pub amount: u32,
    pub kind: PowerKind,
}

/// Cost of a play or ability
///
/// `power` is restricted to `power_domains` (empty means unrestricted);
/// `extras` are add-on requirements such as Accelerate or Deflect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostSpec {
    pub energy: u32,
    pub power: u32,
    pub power_domains: DomainSet,
    pub extras: SmallVec<[PowerRequirement; 2]>,
}

impl CostSpec {
    pub fn new(energy: u32, power: u32, power_domains: DomainSet) -> Self {
        CostSpec {
            energy,
            power,
            power_domains,
            extras: SmallVec::new(),
        }
    }

    pub fn free() -> Self {
        CostSpec::default()
    }

    pub fn energy_only(energy: u32) -> Self {
        CostSpec::new(energy, 0, DomainSet::empty())
    }

    pub fn with_extra(mut self, amount: u32, kind: PowerKind) -> Self {
        if amount > 0 {
            self.extras.push(PowerRequirement { amount, kind });
        }
        self
    }

    pub fn is_free(&self) -> bool {
        self.energy == 0 && self.total_power() == 0
    }

    pub fn total_power(&self) -> u32 {
        self.power + self.extras.iter().map(|e| e.amount).sum::<u32>()
    }
}

impl fmt::Display for CostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} energy", self.energy)?;
        if self.power > 0 {
            let domains: Vec<&str> = self.power_domains.or_all().iter().map(|d| d.name()).collect();
            write!(f, " + {} power ({})", self.power, domains.join("/"))?;
        }
        for extra in &self.extras {
            match extra.kind {
                PowerKind::Specific(d) => write!(f, " + {} {} power", extra.amount, d)?,
                PowerKind::Matching => write!(f, " + {} matching power", extra.amount)?,
                PowerKind::Any => write!(f, " + {} power of any domain", extra.amount)?,
            }
        }
        Ok(())
    }
}

/// A player's banked resources. Stored unsigned, so a value can never go
/// negative; every deduction goes through `pay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    pub energy: u32,
    power: [u32; 6],
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_energy(energy: u32) -> Self {
        ResourcePool {
            energy,
            power: [0; 6],
        }
    }

    pub fn power(&self, domain: Domain) -> u32 {
        self.power[domain.index()]
    }

    pub fn total_power(&self) -> u32 {
        self.power.iter().sum()
    }

    pub fn add_energy(&mut self, amount: u32) {
        self.energy += amount;
    }

    pub fn add_power(&mut self, domain: Domain, amount: u32) {
        self.power[domain.index()] += amount;
    }

    pub fn is_empty(&self) -> bool {
        self.energy == 0 && self.total_power() == 0
    }

    /// Empty the pool (end of turn)
    pub fn clear(&mut self) {
        *self = ResourcePool::default();
    }

    /// Check whether `cost` can be paid; `matching` is the domain set of the
    /// card being paid for.
    pub fn can_pay(&self, cost: &CostSpec, matching: DomainSet) -> bool {
        self.after_payment(cost, matching).is_some()
    }

    /// Pay `cost`, leaving the pool unchanged on failure
    pub fn pay(&mut self, cost: &CostSpec, matching: DomainSet) -> Result<()> {
        match self.after_payment(cost, matching) {
            Some(remaining) => {
                *self = remaining;
                Ok(())
            }
            None => Err(DuelError::illegal(format!(
                "cannot pay {} from pool {}",
                cost, self
            ))),
        }
    }

    /// The pool that would remain after paying, or None if unpayable.
    ///
    /// Each power requirement (the base power and every extra) draws from its
    /// own allowed domains. Units are handed out greedily from the domain
    /// holding the most power, and when a requirement finds its domains empty
    /// an earlier requirement is moved to another domain it also accepts. The
    /// result is unpayable only when no assignment exists at all.
    pub fn after_payment(&self, cost: &CostSpec, matching: DomainSet) -> Option<ResourcePool> {
        let mut pool = *self;
        pool.energy = pool.energy.checked_sub(cost.energy)?;

        let mut demands: SmallVec<[DomainSet; 4]> = SmallVec::new();
        let mut amounts: SmallVec<[u32; 4]> = SmallVec::new();
        demands.push(cost.power_domains.or_all());
        amounts.push(cost.power);
        for extra in &cost.extras {
            demands.push(match extra.kind {
                PowerKind::Specific(d) => DomainSet::single(d),
                PowerKind::Matching => matching.or_all(),
                PowerKind::Any => DomainSet::all(),
            });
            amounts.push(extra.amount);
        }
        if amounts.iter().sum::<u32>() > pool.total_power() {
            return None;
        }

        // Narrowest requirements first keeps re-routing rare
        let mut order: SmallVec<[usize; 4]> = (0..demands.len()).collect();
        order.sort_by_key(|&i| demands[i].len());

        let mut plan = PowerAssignment::new(pool.power, demands.len());
        for i in order {
            for _ in 0..amounts[i] {
                let mut visited = [false; 6];
                if !plan.assign_one(i, &demands, &mut visited) {
                    return None;
                }
            }
        }
        pool.power = plan.free;
        Some(pool)
    }
}

/// Power units handed to each requirement, per domain
struct PowerAssignment {
    free: [u32; 6],
    taken: SmallVec<[[u32; 6]; 4]>,
}

impl PowerAssignment {
    fn new(free: [u32; 6], demands: usize) -> Self {
        PowerAssignment {
            free,
            taken: SmallVec::from_elem([0; 6], demands),
        }
    }

    /// Give one unit to `demand`. Prefers the allowed domain with the most
    /// free power (ties by enumeration order); otherwise takes a unit another
    /// requirement holds and finds that requirement a replacement.
    fn assign_one(&mut self, demand: usize, demands: &[DomainSet], visited: &mut [bool; 6]) -> bool {
        let mut order: SmallVec<[Domain; 6]> = demands[demand].iter().collect();
        // Stable sort keeps enumeration order among equal amounts
        order.sort_by(|a, b| self.free[b.index()].cmp(&self.free[a.index()]));

        if let Some(domain) = order.iter().copied().find(|d| self.free[d.index()] > 0) {
            self.free[domain.index()] -= 1;
            self.taken[demand][domain.index()] += 1;
            return true;
        }
        for domain in order {
            let slot = domain.index();
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            for other in 0..demands.len() {
                if other != demand
                    && self.taken[other][slot] > 0
                    && self.assign_one(other, demands, visited)
                {
                    self.taken[other][slot] -= 1;
                    self.taken[demand][slot] += 1;
                    return true;
                }
            }
        }
        false
    }
}

impl fmt::Display for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{energy: {}", self.energy)?;
        for d in Domain::ALL {
            let amount = self.power(d);
            if amount > 0 {
                write!(f, ", {}: {}", d, amount)?;
            }
        }
        write!(f, "}}")
    }
}
