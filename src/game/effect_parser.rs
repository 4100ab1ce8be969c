//! Ability text classifier
//!
//! Turns a card's ability text into `EffectClause`s, one tagged
//! `EffectPrimitive` per sentence. This is deliberately a conservative
//! phrase matcher: a clause that does not match a known wording becomes
//! `Unsupported` and is reported, never guessed at.

use crate::core::{
    AbilityTiming, ActivationCost, Amount, CardDefinition, Destination, Domain, Duration, EffectClause,
    EffectPrimitive, Keyword, PowerSource, Selector, Side, Speed, TriggerKind,
};

/// Lowercase, ASCII-fold, drop reminder text in parentheses and keyword
/// brackets, collapse whitespace
pub fn normalize(text: &str) -> String {
    let folded = deunicode::deunicode(text).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut depth = 0u32;
    for ch in folded.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '[' | ']' | '"' => {}
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into sentences. "Choose ..." sentences are joined
/// to the sentence that acts on the choice.
pub fn split_clauses(normalized: &str) -> Vec<String> {
    let sequenced = normalized.replace(", then ", ". ").replace(" then ", ". ");
    let mut clauses: Vec<String> = Vec::new();
    let mut carry: Option<String> = None;
    for raw in sequenced.split(['.', ';', '\n']) {
        let clause = raw.trim().trim_end_matches(',').trim();
        if clause.is_empty() {
            continue;
        }
        let clause = match carry.take() {
            Some(prefix) => format!("{} {}", prefix, clause),
            None => clause.to_string(),
        };
        if clause.starts_with("choose ") {
            carry = Some(clause);
        } else {
            clauses.push(clause);
        }
    }
    if let Some(rest) = carry {
        clauses.push(rest);
    }
    clauses
}

/// Classify ability effect text
pub fn parse_effect(text: &str) -> Vec<EffectClause> {
    split_clauses(&normalize(text))
        .into_iter()
        .map(|clause| EffectClause {
            primitive: parse_clause(&clause),
            text: clause,
        })
        .collect()
}

pub fn parse_number(word: &str) -> Option<u32> {
    match word {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => word.trim_start_matches('+').parse().ok(),
    }
}

/// Classify one normalized clause
pub fn parse_clause(clause: &str) -> EffectPrimitive {
    let clause = clause.trim();
    if let Some(rest) = clause.strip_prefix("you may ") {
        return match parse_clause(rest) {
            EffectPrimitive::Unsupported(_) => EffectPrimitive::Unsupported(clause.to_string()),
            inner => EffectPrimitive::Optional(Box::new(inner)),
        };
    }

    let words: Vec<&str> = clause.split_whitespace().collect();
    let Some(&verb) = words.first() else {
        return EffectPrimitive::Unsupported(String::new());
    };
    let duration = if clause.contains("this turn") {
        Duration::ThisTurn
    } else {
        Duration::Permanent
    };

    let parsed = match verb {
        "draw" => parse_draw(&words),
        "discard" => words
            .get(1)
            .and_then(|w| parse_number(w))
            .map(|count| EffectPrimitive::Discard { count }),
        "add" | "gain" => parse_add(&words),
        "channel" => words.get(1).and_then(|w| parse_number(w)).map(|count| EffectPrimitive::ChannelRunes {
            count,
            exhausted: clause.contains("exhausted"),
        }),
        "play" | "create" if clause.contains("token") => parse_token(&words, clause),
        "give" => parse_give(&words, duration),
        "buff" => Some(EffectPrimitive::Buff {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "stun" => Some(EffectPrimitive::Stun {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "ready" => Some(EffectPrimitive::Ready {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "exhaust" => Some(EffectPrimitive::Exhaust {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "move" => parse_move(clause),
        "recall" => Some(EffectPrimitive::Move {
            selector: parse_selector(&words[1..].join(" ")),
            to: Destination::Base,
        }),
        "return" if clause.contains("hand") => {
            let target = clause["return".len()..].split(" to ").next().unwrap_or("");
            Some(EffectPrimitive::ReturnToHand {
                selector: parse_selector(target),
            })
        }
        "kill" => Some(parse_kill(clause)),
        "banish" => Some(EffectPrimitive::Banish {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "deal" => parse_damage(clause),
        "heal" => Some(EffectPrimitive::Heal {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        "attach" => Some(EffectPrimitive::Attach),
        "score" => words
            .get(1)
            .and_then(|w| parse_number(w))
            .filter(|_| clause.contains("point"))
            .map(|points| EffectPrimitive::Score { points }),
        "recycle" => Some(EffectPrimitive::RecycleToDeck {
            selector: parse_selector(&words[1..].join(" ")),
        }),
        _ => None,
    };

    parsed
        .or_else(|| parse_subject_first(clause, &words, duration))
        .unwrap_or_else(|| EffectPrimitive::Unsupported(clause.to_string()))
}

fn parse_draw(words: &[&str]) -> Option<EffectPrimitive> {
    match words.get(1..3) {
        Some(["up", "to"]) => words
            .get(3)
            .and_then(|w| parse_number(w))
            .map(|max| EffectPrimitive::DrawUpTo { max }),
        _ => words
            .get(1)
            .and_then(|w| parse_number(w))
            .map(|count| EffectPrimitive::Draw { count }),
    }
}

fn parse_add(words: &[&str]) -> Option<EffectPrimitive> {
    let amount = parse_number(words.get(1)?)?;
    let rest = &words[2..];
    match rest.first() {
        Some(&"energy") => return Some(EffectPrimitive::AddEnergy { amount }),
        Some(&"point") | Some(&"points") if words[0] == "gain" => {
            return Some(EffectPrimitive::Score { points: amount })
        }
        _ => {}
    }
    if !rest.contains(&"power") {
        return None;
    }
    let source = if rest.contains(&"any") {
        PowerSource::AnyDomain
    } else if let Some(domain) = rest.iter().find_map(|w| Domain::from_name(w)) {
        PowerSource::Domain(domain)
    } else {
        PowerSource::SourceDomain
    };
    Some(EffectPrimitive::AddPower { source, amount })
}

fn parse_token(words: &[&str], clause: &str) -> Option<EffectPrimitive> {
    let count = parse_number(words.get(1)?)?;
    let at = if clause.contains("here") {
        Destination::Here
    } else {
        Destination::Base
    };
    if clause.contains("unit token") {
        let might_idx = words.iter().position(|w| *w == "might")?;
        let might = parse_number(words.get(might_idx.checked_sub(1)?)?)?;
        let unit_idx = words.iter().position(|w| *w == "unit")?;
        let name = title_case(&words.get(might_idx + 1..unit_idx)?.join(" "));
        return Some(EffectPrimitive::CreateUnitToken { count, might, name, at });
    }
    if clause.contains("gear token") {
        let gear_idx = words.iter().position(|w| *w == "gear")?;
        let name = title_case(&words.get(2..gear_idx)?.join(" "));
        return Some(EffectPrimitive::CreateGearToken { count, name });
    }
    None
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Position and value of a "+N might" / "-N might" pair
fn might_delta(words: &[&str]) -> Option<(usize, i32)> {
    words.windows(2).enumerate().find_map(|(i, pair)| {
        let token = pair[0];
        if pair[1] != "might" || !(token.starts_with('+') || token.starts_with('-')) {
            return None;
        }
        let value: i32 = token.trim_start_matches('+').parse().ok()?;
        Some((i, value))
    })
}

/// Position and value of the first rules keyword in `words`
fn find_keyword(words: &[&str]) -> Option<(usize, Keyword)> {
    words.iter().enumerate().find_map(|(i, w)| {
        let text = match words.get(i + 1) {
            Some(next) if next.parse::<u32>().is_ok() => format!("{} {}", w, next),
            _ => w.to_string(),
        };
        match Keyword::parse(&text) {
            Keyword::Other(_) | Keyword::Action | Keyword::Reaction => None,
            kw => Some((i, kw)),
        }
    })
}

fn parse_give(words: &[&str], duration: Duration) -> Option<EffectPrimitive> {
    if let Some((idx, delta)) = might_delta(words) {
        return Some(EffectPrimitive::Might {
            selector: parse_selector(&words[1..idx].join(" ")),
            delta,
            duration,
        });
    }
    let (idx, keyword) = find_keyword(&words[1..])?;
    Some(EffectPrimitive::GrantKeyword {
        selector: parse_selector(&words[1..idx + 1].join(" ")),
        keyword,
        duration,
    })
}

/// Clauses that name the affected cards before the verb:
/// "a unit gets +2 might this turn", "it loses tank", "they fight"
fn parse_subject_first(clause: &str, words: &[&str], duration: Duration) -> Option<EffectPrimitive> {
    if words.iter().any(|w| *w == "fight" || *w == "fights") {
        return Some(EffectPrimitive::Fight);
    }
    let verb_idx = words
        .iter()
        .position(|w| matches!(*w, "gets" | "get" | "gains" | "gain" | "loses" | "lose"))?;
    let subject = words[..verb_idx].join(" ");
    let selector = parse_selector(&subject);
    let rest = &words[verb_idx + 1..];
    match words[verb_idx] {
        "loses" | "lose" => {
            let (_, keyword) = find_keyword(rest)?;
            Some(EffectPrimitive::RemoveKeyword {
                selector,
                keyword,
                duration,
            })
        }
        _ => {
            if let Some((_, delta)) = might_delta(rest) {
                return Some(EffectPrimitive::Might {
                    selector,
                    delta,
                    duration,
                });
            }
            if clause.contains("buff") {
                return Some(EffectPrimitive::Buff { selector });
            }
            let (_, keyword) = find_keyword(rest)?;
            Some(EffectPrimitive::GrantKeyword {
                selector,
                keyword,
                duration,
            })
        }
    }
}

fn parse_move(clause: &str) -> Option<EffectPrimitive> {
    let body = clause.strip_prefix("move ")?;
    if let Some(subject) = body.strip_suffix(" here").or_else(|| body.strip_suffix(" to here")) {
        return Some(EffectPrimitive::Move {
            selector: parse_selector(subject),
            to: Destination::Here,
        });
    }
    let (subject, dest) = body.rsplit_once(" to ")?;
    if dest.ends_with("base") {
        Some(EffectPrimitive::Move {
            selector: parse_selector(subject),
            to: Destination::Base,
        })
    } else {
        None
    }
}

fn parse_kill(clause: &str) -> EffectPrimitive {
    let body = clause.trim_start_matches("kill").trim();
    let (subject, max_might) = match body.split_once(" with ") {
        Some((subject, qualifier)) if qualifier.contains("might or less") => {
            let max = qualifier.split_whitespace().next().and_then(parse_number);
            (subject, max)
        }
        _ => (body, None),
    };
    EffectPrimitive::Kill {
        selector: parse_selector(subject),
        max_might,
    }
}

fn parse_damage(clause: &str) -> Option<EffectPrimitive> {
    let body = clause.strip_prefix("deal ")?;
    let (amount_text, subject) = body.rsplit_once(" to ")?;
    let amount = if amount_text.contains("equal to my might") || amount_text.contains("equal to this") {
        Amount::SourceMight
    } else if amount_text.contains("equal to its might") {
        Amount::FirstTargetMight
    } else {
        Amount::Fixed(parse_number(amount_text.split_whitespace().next()?)?)
    };
    Some(EffectPrimitive::Damage {
        selector: parse_selector(subject),
        amount,
    })
}

/// Which cards a phrase refers to
pub fn parse_selector(phrase: &str) -> Selector {
    let phrase = phrase.replace("this turn", "");
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let has = |w: &str| words.contains(&w);

    let side = if has("enemy") || has("enemies") || has("opposing") {
        Side::Enemy
    } else if has("friendly") || has("your") || phrase.contains("you control") {
        Side::Friendly
    } else {
        Side::Any
    };

    let determiner = words
        .first()
        .is_some_and(|w| matches!(*w, "a" | "an" | "target" | "up" | "another"));
    let area = has("all") || has("each") || has("every") || (has("units") && !determiner);
    if area {
        return if has("here") {
            Selector::AllHere(side)
        } else if phrase.contains("at a battlefield") || phrase.contains("at that battlefield") || has("there") {
            Selector::AllAtTargetBattlefield(side)
        } else {
            Selector::AllUnits(side)
        };
    }
    if determiner {
        return Selector::Targets;
    }
    if has("me") || has("myself") || has("this") || has("itself") {
        return Selector::This;
    }
    if phrase.contains("first") {
        return Selector::FirstTarget;
    }
    if phrase.contains("second") || phrase.contains("other") {
        return Selector::SecondTarget;
    }
    Selector::Targets
}

/// Classify a card's trigger text into how its ability is used
pub fn parse_trigger(trigger: &str, def: &CardDefinition) -> AbilityTiming {
    if def.effect.trim().is_empty() {
        return AbilityTiming::None;
    }
    if def.is_spell() {
        return AbilityTiming::Spell;
    }
    let text = normalize(trigger);

    if text.is_empty() {
        if def.has_keyword(&Keyword::Deathknell) {
            return AbilityTiming::Triggered(TriggerKind::Deathknell);
        }
        return AbilityTiming::Static;
    }
    if text.contains("deathknell") || text.contains("when i die") || text.contains("when this dies") {
        return AbilityTiming::Triggered(TriggerKind::Deathknell);
    }
    if text.contains("play me") || text.contains("play this") || text.contains("when played") {
        return AbilityTiming::Triggered(TriggerKind::OnPlay);
    }
    if text.contains("conquer") {
        return AbilityTiming::Triggered(TriggerKind::OnConquer);
    }
    if text.contains("hold") {
        return AbilityTiming::Triggered(TriggerKind::OnHold);
    }
    if text.contains("attack") {
        return AbilityTiming::Triggered(TriggerKind::OnAttack);
    }
    if text.contains("defend") {
        return AbilityTiming::Triggered(TriggerKind::OnDefend);
    }
    if text.contains("start of your turn") || text.contains("beginning of your turn") {
        return AbilityTiming::Triggered(TriggerKind::StartOfTurn);
    }

    if let Some(cost) = parse_activation_cost(&text) {
        let speed = if text.contains("reaction") {
            Speed::Reaction
        } else if text.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "action") {
            Speed::Action
        } else {
            Speed::Normal
        };
        return AbilityTiming::Activated { cost, speed };
    }
    AbilityTiming::Static
}

/// Ability timing of a card definition
pub fn ability_timing(def: &CardDefinition) -> AbilityTiming {
    parse_trigger(&def.trigger, def)
}

fn parse_activation_cost(text: &str) -> Option<ActivationCost> {
    let mut cost = ActivationCost::default();
    let words: Vec<&str> = text
        .split([' ', ',', ':'])
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    let mut recognized = false;
    for (i, word) in words.iter().enumerate() {
        match *word {
            "exhaust" | "tap" => {
                cost.exhaust = true;
                recognized = true;
            }
            "kill" if matches!(words.get(i + 1), Some(&"this") | Some(&"me")) => {
                cost.kill_self = true;
                recognized = true;
            }
            _ => {
                if let Ok(n) = word.parse::<u32>() {
                    match words.get(i + 1) {
                        Some(&"power") => cost.power += n,
                        _ => cost.energy += n,
                    }
                    recognized = true;
                } else if word.chars().all(|c| c == 'c') && word.len() <= 4 {
                    cost.power += word.len() as u32;
                    recognized = true;
                }
            }
        }
    }
    recognized.then_some(cost)
}
