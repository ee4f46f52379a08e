//! Effect engine: named modifications to player or faction state.
//!
//! An instruction such as `["interest", "10"]` is parsed once into an
//! [`EffectKind`]; `trigger` and `undo_effect` are plain matches over it.

use crate::content::TechId;
use crate::{Player, SimError};
use serde::{Deserialize, Serialize};

/// Source of an effect, used for bookkeeping and undo identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectParent {
    /// Kind of the source, e.g. "tech".
    pub kind: String,
    pub id: String,
}

impl EffectParent {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn tech(id: &TechId) -> Self {
        Self::new("tech", id.0.clone())
    }
}

/// One variant per opcode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Interest(i64),
    Income(i64),
    CostLabor(i64),
    JobProfit(i64),
    /// One-shot; undo does nothing.
    DisplayDiscover(String),
    Suspicion { faction: String, amount: i64 },
    Discover { faction: String, amount: i64 },
}

/// A parsed effect bound to its parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    parent: EffectParent,
    kind: EffectKind,
}

fn amount(opcode: &str, raw: Option<&str>) -> Result<i64, SimError> {
    let raw = raw.ok_or_else(|| SimError::InvalidEffect(format!("{opcode}: missing amount")))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SimError::InvalidEffect(format!("{opcode}: bad amount {raw:?}")))
}

impl Effect {
    /// Parse an opcode followed by positional string arguments.
    pub fn parse<S: AsRef<str>>(parent: EffectParent, instruction: &[S]) -> Result<Self, SimError> {
        let mut args = instruction.iter().map(AsRef::as_ref);
        let opcode = args
            .next()
            .ok_or_else(|| SimError::InvalidEffect("empty instruction".to_string()))?;
        let kind = match opcode {
            "interest" => EffectKind::Interest(amount(opcode, args.next())?),
            "income" => EffectKind::Income(amount(opcode, args.next())?),
            "cost_labor" => EffectKind::CostLabor(amount(opcode, args.next())?),
            "job_profit" => EffectKind::JobProfit(amount(opcode, args.next())?),
            "display_discover" => {
                let label = args.next().ok_or_else(|| {
                    SimError::InvalidEffect("display_discover: missing label".to_string())
                })?;
                EffectKind::DisplayDiscover(label.to_string())
            }
            "suspicion" | "discover" => {
                let faction = args
                    .next()
                    .ok_or_else(|| SimError::InvalidEffect(format!("{opcode}: missing faction")))?
                    .to_string();
                let amount = amount(opcode, args.next())?;
                if opcode == "suspicion" {
                    EffectKind::Suspicion { faction, amount }
                } else {
                    EffectKind::Discover { faction, amount }
                }
            }
            other => return Err(SimError::InvalidEffect(format!("unknown opcode {other:?}"))),
        };
        if let Some(extra) = args.next() {
            return Err(SimError::InvalidEffect(format!(
                "{opcode}: unexpected argument {extra:?}"
            )));
        }
        Ok(Self { parent, kind })
    }

    pub fn parent(&self) -> &EffectParent {
        &self.parent
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    /// Apply the effect to `player`.
    pub fn trigger(&self, player: &mut Player) -> Result<(), SimError> {
        tracing::debug!(parent = %self.parent.id, effect = ?self.kind, "trigger effect");
        self.apply(player, 1)
    }

    /// Reverse a previously triggered effect. Calling this on an effect that
    /// was never triggered leaves the player in an undefined state.
    pub fn undo_effect(&self, player: &mut Player) -> Result<(), SimError> {
        tracing::debug!(parent = %self.parent.id, effect = ?self.kind, "undo effect");
        self.apply(player, -1)
    }

    fn apply(&self, player: &mut Player, sign: i64) -> Result<(), SimError> {
        match &self.kind {
            EffectKind::Interest(v) => player.interest_rate += sign * v,
            EffectKind::Income(v) => player.income += sign * v,
            EffectKind::CostLabor(v) => {
                player.labor_bonus -= sign * v;
                player.rescale_labor()?;
            }
            EffectKind::JobProfit(v) => player.job_bonus += sign * v,
            EffectKind::DisplayDiscover(label) => {
                if sign > 0 {
                    player.display_discover = label.clone();
                }
            }
            EffectKind::Suspicion { faction, amount } => {
                let group = player
                    .groups
                    .get_mut(faction)
                    .ok_or_else(|| SimError::UnknownFaction(faction.clone()))?;
                group.suspicion_decay += sign * amount;
            }
            EffectKind::Discover { faction, amount } => {
                let group = player
                    .groups
                    .get_mut(faction)
                    .ok_or_else(|| SimError::UnknownFaction(faction.clone()))?;
                group.discover_bonus -= sign * amount;
            }
        }
        Ok(())
    }
}
