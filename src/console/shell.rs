// src/console/shell.rs - Local pseudo-shell answering commands against the register bank
use crate::hardware::RegisterBank;
use piforge_shared::{MAX_DUTY_CYCLE, MAX_GPIO_PIN, PinMode};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("USAGE: {0}")]
    Usage(&'static str),
    #[error("INVALID PIN: {0} (0-27)")]
    InvalidPin(String),
    #[error("INVALID VALUE: {0} (0|1)")]
    InvalidValue(String),
    #[error("INVALID MODE: {0} (in|out|pwm)")]
    InvalidMode(String),
    #[error("INVALID DUTY: {0} (0-100)")]
    InvalidDuty(String),
}

/// What the terminal should do with a command's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellReply {
    Lines(Vec<String>),
    Clear,
    /// Start the guest OS.
    Boot,
}

impl ShellReply {
    fn line(text: impl Into<String>) -> Self {
        ShellReply::Lines(vec![text.into()])
    }
}

const USAGE_MODE: &str = "gpio-mode <pin> <in|out|pwm>";
const USAGE_WRITE: &str = "gpio-write <pin> <0|1>";
const USAGE_READ: &str = "gpio-read <pin>";
const USAGE_PWM: &str = "gpio-pwm <pin> <0-100>";

/// Run one command line. Input is trimmed and lowercased first; an empty line yields
/// no output.
pub fn execute(line: &str, bank: &mut RegisterBank) -> ShellReply {
    let command = line.trim().to_lowercase();
    let mut words = command.split_whitespace();
    let Some(name) = words.next() else {
        return ShellReply::Lines(Vec::new());
    };
    let args: Vec<&str> = words.collect();
    tracing::debug!("Shell command: {}", command);

    let result = match name {
        "ls" => Ok(ShellReply::line("BIN  ETC  USR  HOME")),
        "help" => Ok(ShellReply::line("AVAILABLE: LS, HELP, CLEAR, BOOT, GPIO-HELP")),
        "clear" => Ok(ShellReply::Clear),
        "boot" => Ok(ShellReply::Boot),
        "gpio-help" => Ok(gpio_help()),
        "gpio-status" => Ok(gpio_status(bank)),
        "gpio-mode" => gpio_mode(&args, bank),
        "gpio-write" => gpio_write(&args, bank),
        "gpio-read" => gpio_read(&args, bank),
        "gpio-pwm" => gpio_pwm(&args, bank),
        _ => Ok(ShellReply::line(format!("ERR: CMD NOT FOUND: {}", command))),
    };
    result.unwrap_or_else(|e| ShellReply::line(format!("ERR: {}", e)))
}

fn parse_pin(arg: &str) -> Result<u8, ShellError> {
    arg.parse::<u8>()
        .ok()
        .filter(|pin| *pin <= MAX_GPIO_PIN)
        .ok_or_else(|| ShellError::InvalidPin(arg.to_string()))
}

fn two_args<'a>(args: &[&'a str], usage: &'static str) -> Result<(&'a str, &'a str), ShellError> {
    match args {
        [a, b] => Ok((*a, *b)),
        _ => Err(ShellError::Usage(usage)),
    }
}

fn gpio_mode(args: &[&str], bank: &mut RegisterBank) -> Result<ShellReply, ShellError> {
    let (pin, mode) = two_args(args, USAGE_MODE)?;
    let pin = parse_pin(pin)?;
    let mode: PinMode = mode.parse().map_err(|_| ShellError::InvalidMode(mode.to_string()))?;
    bank.set_mode(pin, mode);
    Ok(ShellReply::line(format!("GPIO{} MODE: {}", pin, mode)))
}

fn gpio_write(args: &[&str], bank: &mut RegisterBank) -> Result<ShellReply, ShellError> {
    let (pin, value) = two_args(args, USAGE_WRITE)?;
    let pin = parse_pin(pin)?;
    let value = match value {
        "0" => 0,
        "1" => 1,
        other => return Err(ShellError::InvalidValue(other.to_string())),
    };
    bank.digital_write(pin, value);
    Ok(ShellReply::line(format!("GPIO{} = {}", pin, bank.digital_read(pin))))
}

fn gpio_read(args: &[&str], bank: &mut RegisterBank) -> Result<ShellReply, ShellError> {
    let [pin] = args else {
        return Err(ShellError::Usage(USAGE_READ));
    };
    let pin = parse_pin(pin)?;
    Ok(ShellReply::line(format!("GPIO{} = {}", pin, bank.digital_read(pin))))
}

fn gpio_pwm(args: &[&str], bank: &mut RegisterBank) -> Result<ShellReply, ShellError> {
    let (pin, duty) = two_args(args, USAGE_PWM)?;
    let pin = parse_pin(pin)?;
    let duty = duty
        .parse::<u8>()
        .ok()
        .filter(|d| *d <= MAX_DUTY_CYCLE)
        .ok_or_else(|| ShellError::InvalidDuty(duty.to_string()))?;
    bank.set_pwm(pin, duty);
    let shown = bank
        .pin_state(pin)
        .and_then(|s| s.duty_cycle)
        .map_or_else(|| "-".to_string(), |d| format!("{}%", d));
    Ok(ShellReply::line(format!("GPIO{} PWM: {}", pin, shown)))
}

fn gpio_status(bank: &RegisterBank) -> ShellReply {
    let mut lines = vec!["PIN  MODE  VALUE  PWM".to_string()];
    for snapshot in bank.all_pins() {
        let pwm = snapshot
            .state
            .duty_cycle
            .map_or_else(|| "-".to_string(), |d| format!("{}%", d));
        lines.push(format!(
            "{:>3}  {:<4}  {:<5}  {}",
            snapshot.pin,
            snapshot.state.mode.as_str(),
            snapshot.state.value,
            pwm
        ));
    }
    ShellReply::Lines(lines)
}

fn gpio_help() -> ShellReply {
    ShellReply::Lines(
        [
            "GPIO COMMANDS:",
            "  gpio-mode <pin> <in|out|pwm>   SET PIN MODE",
            "  gpio-write <pin> <0|1>         DRIVE AN OUT PIN",
            "  gpio-read <pin>                READ A PIN",
            "  gpio-pwm <pin> <0-100>         SET PWM DUTY CYCLE",
            "  gpio-status                    LIST ALL PINS",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(reply: ShellReply) -> Vec<String> {
        match reply {
            ShellReply::Lines(lines) => lines,
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_generic_commands() {
        let mut bank = RegisterBank::new();
        assert_eq!(lines(execute("  LS ", &mut bank)), vec!["BIN  ETC  USR  HOME"]);
        assert_eq!(lines(execute("help", &mut bank)), vec!["AVAILABLE: LS, HELP, CLEAR, BOOT, GPIO-HELP"]);
        assert_eq!(execute("clear", &mut bank), ShellReply::Clear);
        assert_eq!(execute("BOOT", &mut bank), ShellReply::Boot);
        assert!(lines(execute("   ", &mut bank)).is_empty());
        assert_eq!(lines(execute("Reboot now", &mut bank)), vec!["ERR: CMD NOT FOUND: reboot now"]);
    }

    #[test]
    fn test_gpio_round_trip() {
        let mut bank = RegisterBank::new();
        assert_eq!(lines(execute("gpio-mode 17 OUT", &mut bank)), vec!["GPIO17 MODE: OUT"]);
        assert_eq!(lines(execute("gpio-write 17 1", &mut bank)), vec!["GPIO17 = 1"]);
        assert_eq!(lines(execute("gpio-read 17", &mut bank)), vec!["GPIO17 = 1"]);
        // Writing an input is accepted by the shell and ignored by the bank.
        assert_eq!(lines(execute("gpio-write 4 1", &mut bank)), vec!["GPIO4 = 0"]);
    }

    #[test]
    fn test_gpio_pwm_and_status() {
        let mut bank = RegisterBank::new();
        execute("gpio-mode 18 pwm", &mut bank);
        assert_eq!(lines(execute("gpio-pwm 18 40", &mut bank)), vec!["GPIO18 PWM: 40%"]);
        let status = lines(execute("gpio-status", &mut bank));
        assert_eq!(status.len(), 29);
        assert_eq!(status[19], " 18  PWM   1      40%");
        assert_eq!(status[1], "  0  IN    0      -");
    }

    #[test]
    fn test_argument_errors() {
        let mut bank = RegisterBank::new();
        assert_eq!(
            lines(execute("gpio-mode 17", &mut bank)),
            vec!["ERR: USAGE: gpio-mode <pin> <in|out|pwm>"]
        );
        assert_eq!(
            lines(execute("gpio-read 28", &mut bank)),
            vec!["ERR: INVALID PIN: 28 (0-27)"]
        );
        assert_eq!(
            lines(execute("gpio-mode 3 input", &mut bank)),
            vec!["ERR: INVALID MODE: input (in|out|pwm)"]
        );
        assert_eq!(
            lines(execute("gpio-write 3 2", &mut bank)),
            vec!["ERR: INVALID VALUE: 2 (0|1)"]
        );
        assert_eq!(
            lines(execute("gpio-pwm 3 101", &mut bank)),
            vec!["ERR: INVALID DUTY: 101 (0-100)"]
        );
    }
}
