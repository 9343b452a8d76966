// Turns the command line into a validated run configuration.
// Numbers that don't parse or fall outside their range quietly become the
// default; only a missing ROM path stops the program.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::Parser;

use crate::error::Error;

pub const LAYER_IDS: RangeInclusive<u32> = 0..=326;
pub const FRAMESKIP_RANGE: RangeInclusive<u32> = 1..=10;
pub const LETTERBOX_CHOICES: [u32; 4] = [0, 16, 48, 64];

pub const DEFAULT_LAYER1: u16 = 270;
pub const DEFAULT_LAYER2: u16 = 269;
pub const DEFAULT_FRAMESKIP: u32 = 1;
pub const DEFAULT_ASPECT_RATIO: u32 = 0;

const DUMP_FLAG: &str = "--dump";

// Raw tokens as clap sees them. Numbers stay strings so a bad value can
// fall back to its default instead of being a hard parse error, and the
// slots take anything (even `-x`) so nothing after the ROM path can fail.
#[derive(Parser, Debug)]
#[command(name = "bgview", version, about = "Animated ROM background layer viewer")]
struct RawArgs {
    /// Path to the ROM image
    rom_path: PathBuf,

    /// [layer1=270] [layer2=269] [frameskip=1] [aspectRatio=0]; extra tokens are ignored
    #[arg(num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
    params: Vec<String>,

    /// Write frames 0, 15 and 29 as PPM files and stop after 30 frames
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rom_path: PathBuf,
    pub layer1: u16,
    pub layer2: u16, // 0 = single-layer mode
    pub frameskip: u32,
    pub aspect_ratio: u32, // letterbox height in rows
    pub dump_frames: bool,
}

impl Config {
    /// The second layer to try, if one was asked for.
    pub fn second_layer(&self) -> Option<u16> {
        (self.layer2 != 0).then_some(self.layer2)
    }
}

/// Parse `tokens` (program name first, like `std::env::args`) into a `Config`.
pub fn resolve<I, T>(tokens: I) -> Result<Config, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let raw = RawArgs::try_parse_from(tokens)?;

    // Once the first slot is filled clap hands every later token to `params`,
    // so a trailing --dump shows up there rather than as the flag.
    let dump_frames = raw.dump || raw.params.iter().any(|t| t.as_str() == DUMP_FLAG);
    let mut slots = raw.params.iter().filter(|t| t.as_str() != DUMP_FLAG).map(String::as_str);
    let (l1, l2, fs, ar) = (slots.next(), slots.next(), slots.next(), slots.next());

    let layer1 = in_range(l1, DEFAULT_LAYER1.into(), &LAYER_IDS);
    let layer2 = in_range(l2, DEFAULT_LAYER2.into(), &LAYER_IDS);
    let frameskip = in_range(fs, DEFAULT_FRAMESKIP, &FRAMESKIP_RANGE);
    let aspect_ratio = parse_u32(ar)
        .filter(|v| LETTERBOX_CHOICES.contains(v))
        .unwrap_or(DEFAULT_ASPECT_RATIO);

    Ok(Config {
        rom_path: raw.rom_path,
        // LAYER_IDS tops out at 326, so these always fit.
        layer1: layer1 as u16,
        layer2: layer2 as u16,
        frameskip,
        aspect_ratio,
        dump_frames,
    })
}

#[inline]
fn parse_u32(token: Option<&str>) -> Option<u32> {
    token.and_then(|t| t.trim().parse::<u32>().ok())
}

fn in_range(token: Option<&str>, default: u32, range: &RangeInclusive<u32>) -> u32 {
    parse_u32(token).filter(|v| range.contains(v)).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(tokens: &[&str]) -> Config {
        let mut all = vec!["bgview"];
        all.extend_from_slice(tokens);
        resolve(all).unwrap()
    }

    #[test]
    fn defaults_when_only_rom_given() {
        let c = cfg(&["game.sfc"]);
        assert_eq!(c.rom_path, PathBuf::from("game.sfc"));
        assert_eq!(c.layer1, 270);
        assert_eq!(c.layer2, 269);
        assert_eq!(c.frameskip, 1);
        assert_eq!(c.aspect_ratio, 0);
        assert!(!c.dump_frames);
        assert_eq!(c.second_layer(), Some(269));
    }

    #[test]
    fn explicit_values_are_kept() {
        let c = cfg(&["game.sfc", "12", "0", "4", "48", "--dump"]);
        assert_eq!((c.layer1, c.layer2, c.frameskip, c.aspect_ratio), (12, 0, 4, 48));
        assert!(c.dump_frames);
        assert_eq!(c.second_layer(), None);
    }

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let c = cfg(&["game.sfc", "999", "327", "0", "5"]);
        assert_eq!(c.layer1, 270);
        assert_eq!(c.layer2, 269);
        assert_eq!(c.frameskip, 1);
        assert_eq!(c.aspect_ratio, 0);
    }

    #[test]
    fn unparsable_and_negative_values_fall_back() {
        let c = cfg(&["game.sfc", "abc", "-3", "fast", "-16"]);
        assert_eq!(c.layer1, 270);
        assert_eq!(c.layer2, 269);
        assert_eq!(c.frameskip, 1);
        assert_eq!(c.aspect_ratio, 0);
    }

    #[test]
    fn range_edges_are_accepted() {
        let c = cfg(&["game.sfc", "0", "326", "10", "64"]);
        assert_eq!((c.layer1, c.layer2, c.frameskip, c.aspect_ratio), (0, 326, 10, 64));
    }

    #[test]
    fn dump_flag_may_come_first() {
        let c = cfg(&["--dump", "game.sfc", "3"]);
        assert!(c.dump_frames);
        assert_eq!(c.layer1, 3);
    }

    #[test]
    fn dash_tokens_in_value_slots_fall_back() {
        let c = cfg(&["game.sfc", "-x"]);
        assert_eq!(c.layer1, 270);
        let c = cfg(&["game.sfc", "5", "--fast", "-", "-16"]);
        assert_eq!((c.layer1, c.layer2, c.frameskip, c.aspect_ratio), (5, 269, 1, 0));
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let c = cfg(&["game.sfc", "1", "2", "3", "16", "--dump", "extra", "more"]);
        assert_eq!((c.layer1, c.layer2, c.frameskip, c.aspect_ratio), (1, 2, 3, 16));
        assert!(c.dump_frames);
        let c = cfg(&["game.sfc", "--dump", "extra"]);
        assert!(c.dump_frames);
        assert_eq!(c.layer1, 270);
    }

    #[test]
    fn dump_flag_between_values_does_not_shift_slots() {
        let c = cfg(&["game.sfc", "7", "--dump", "8"]);
        assert!(c.dump_frames);
        assert_eq!((c.layer1, c.layer2), (7, 8));
    }

    #[test]
    fn missing_rom_path_is_a_usage_error() {
        let err = resolve(["bgview"]).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }
}
