//! Texty notifikací (Discord markdown).

use crate::rules::{Evaluation, Trigger};

pub const MATCH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Jedna zpráva na hráče a zápas. `None`, když hráč v zápase nic nezískal.
pub fn format_player_message(name: &str, eval: &Evaluation, account_id: u32) -> Option<String> {
    let triggers: Vec<&Trigger> = eval.triggers_for(account_id).collect();
    if triggers.is_empty() {
        return None;
    }

    let mut lines = vec![format!(
        "Player **{}** earned {} challenge(s) in match {} (Start: {}):",
        name,
        triggers.len(),
        eval.match_id,
        eval.match_time.format(MATCH_TIME_FORMAT)
    )];

    let mut total: i64 = 0;
    for t in &triggers {
        lines.push(format!(
            "• {} ({:+} pts) | Damage: {} | KDA: {} | Hero: {}",
            t.name, t.points, t.damage, t.kda, t.hero
        ));
        total += i64::from(t.points);
    }
    lines.push(format!("Total points: {total:+}"));

    Some(lines.join("\n"))
}

/// `(name, reason)` páry → jedna souhrnná zpráva.
pub fn format_privacy_summary(issues: &[(String, String)]) -> Option<String> {
    if issues.is_empty() {
        return None;
    }
    let mut lines = vec!["🔒 **Steam Privacy Issues Detected**".to_string(), String::new()];
    lines.extend(issues.iter().map(|(name, reason)| format!("• **{name}** – {reason}")));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{PlayerLine, Trigger};
    use chrono::{TimeZone, Utc};

    fn trigger(name: &str, points: i32) -> Trigger {
        Trigger {
            account_id: 7,
            match_id: 99,
            name: name.to_string(),
            points,
            hero: "Pudge".to_string(),
            kda: "0/21/3".to_string(),
            damage: 4200,
        }
    }

    #[test]
    fn player_message_lists_each_trigger_and_total() {
        let eval = Evaluation {
            match_id: 99,
            match_time: Utc.with_ymd_and_hms(2026, 1, 20, 18, 5, 0).unwrap(),
            duration: 1800,
            triggers: vec![trigger("0 Kill Game", -20), trigger("Wet Noodle", 3)],
            players: vec![PlayerLine {
                account_id: 7,
                name: "Sheep".into(),
                hero: "Pudge".into(),
                kda: "0/21/3".into(),
                won: false,
            }],
        };
        let msg = format_player_message("Sheep", &eval, 7).unwrap();
        assert_eq!(
            msg,
            "Player **Sheep** earned 2 challenge(s) in match 99 (Start: 2026-01-20 18:05 UTC):\n\
             • 0 Kill Game (-20 pts) | Damage: 4200 | KDA: 0/21/3 | Hero: Pudge\n\
             • Wet Noodle (+3 pts) | Damage: 4200 | KDA: 0/21/3 | Hero: Pudge\n\
             Total points: -17"
        );
        assert!(format_player_message("Nobody", &eval, 8).is_none());
    }

    #[test]
    fn privacy_summary() {
        assert!(format_privacy_summary(&[]).is_none());
        let msg = format_privacy_summary(&[("Kingy".into(), "No matches visible / private profile".into())]).unwrap();
        assert!(msg.starts_with("🔒 **Steam Privacy Issues Detected**\n\n"));
        assert!(msg.ends_with("• **Kingy** – No matches visible / private profile"));
    }
}
