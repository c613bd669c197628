//! Dice roll: `!20`, `!3d6`, `!r 2d10`.

use rand::Rng;
use serenity::async_trait;
use super::{Call, Command, parser::ROLL_COMMAND};

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;
const DEFAULT_DICE: Dice = Dice { count: 1, sides: 20 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
}

impl Dice {
    /// Parse `NdM`, `dM` or `M`.
    pub fn parse(text: &str) -> Option<Dice> {
        let (count, sides) = match text.split_once('d') {
            Some(("", sides)) => (1, sides.parse().ok()?),
            Some((count, sides)) => (count.parse().ok()?, sides.parse().ok()?),
            None => (1, text.parse().ok()?),
        };
        if (1..=MAX_DICE).contains(&count) && (2..=MAX_SIDES).contains(&sides) {
            Some(Dice { count, sides })
        } else {
            None
        }
    }
    pub fn roll<R: Rng>(&self, rng: &mut R) -> Vec<u32> {
        (0..self.count).map(|_| rng.gen_range(1..=self.sides)).collect()
    }
}

/// Dice requested by the words of the message.
fn requested(args: &[String]) -> Result<Dice, String> {
    let text = match args.first().map(String::as_str) {
        Some(ROLL_COMMAND) => args.get(1).map(String::as_str),
        other => other,
    };
    match text {
        None => Ok(DEFAULT_DICE),
        Some(text) => Dice::parse(text).ok_or_else(|| format!("invalid dice {:?}", text)),
    }
}

fn format_roll(dice: Dice, rolls: &[u32]) -> String {
    let total: u32 = rolls.iter().sum();
    match rolls {
        [single] => format!("🎲 {}d{}: **{}**", dice.count, dice.sides, single),
        _ => {
            let detail = rolls.iter().map(u32::to_string).collect::<Vec<_>>().join(" + ");
            format!("🎲 {}d{}: {} = **{}**", dice.count, dice.sides, detail, total)
        }
    }
}

pub struct Roll;

#[async_trait]
impl Command for Roll {
    fn name(&self) -> &'static str {
        ROLL_COMMAND
    }
    fn description(&self) -> &'static str {
        "Rolls dice: `!20` rolls a d20, `!3d6` or `!r 3d6` rolls three d6."
    }
    async fn execute(&self, call: &Call<'_>) -> Result<String, String> {
        let dice = requested(call.args)?;
        let rolls = dice.roll(&mut rand::thread_rng());
        Ok(format_roll(dice, &rolls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use super::super::test_utils::words;

    #[test]
    fn parse() {
        assert_eq!(Dice::parse("20"), Some(Dice { count: 1, sides: 20 }));
        assert_eq!(Dice::parse("3d6"), Some(Dice { count: 3, sides: 6 }));
        assert_eq!(Dice::parse("d8"), Some(Dice { count: 1, sides: 8 }));
        assert_eq!(Dice::parse("0d6"), None);
        assert_eq!(Dice::parse("2d1"), None);
        assert_eq!(Dice::parse("101d6"), None);
        assert_eq!(Dice::parse("2x6"), None);
        assert_eq!(Dice::parse("-3"), None);
    }
    #[test]
    fn requested_dice() {
        assert_eq!(requested(&words("20")), Ok(Dice { count: 1, sides: 20 }));
        assert_eq!(requested(&words("r 2d6")), Ok(Dice { count: 2, sides: 6 }));
        assert_eq!(requested(&words("r")), Ok(DEFAULT_DICE));
        assert!(requested(&words("r lots")).is_err());
    }
    #[test]
    fn rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let dice = Dice { count: 50, sides: 6 };
        let rolls = dice.roll(&mut rng);
        assert_eq!(rolls.len(), 50);
        assert!(rolls.iter().all(|r| (1..=6).contains(r)));
    }
    #[test]
    fn format() {
        assert_eq!(format_roll(Dice { count: 1, sides: 20 }, &[17]), "🎲 1d20: **17**");
        assert_eq!(format_roll(Dice { count: 3, sides: 6 }, &[1, 4, 6]), "🎲 3d6: 1 + 4 + 6 = **11**");
    }
}
