// Integration tests for the guest tag protocol

use piforge::PinMode;
use piforge::bridge::SerialBridge;
use piforge::bridge::injection::{INJECTION_COMMANDS, injection_bytes};
use piforge::bridge::tokenizer::{GpioTag, TagTokenizer};
use piforge::hardware::RegisterBank;
use proptest::prelude::*;

#[test]
fn test_tag_split_across_single_byte_appends() {
    let mut bank = RegisterBank::new();
    bank.set_mode(17, PinMode::Out);
    let mut bridge = SerialBridge::new(100);
    for byte in b"...[GPIO_OUT: 17 1]...".iter() {
        bridge.on_guest_output(&mut bank, std::slice::from_ref(byte));
    }
    assert_eq!(bank.digital_read(17), 1);
}

#[test]
fn test_out_tag_on_input_pin_is_noop() {
    let mut bank = RegisterBank::new();
    let mut bridge = SerialBridge::new(100);
    let tags = bridge.on_guest_output(&mut bank, b"[GPIO_OUT: 17 1]");
    assert_eq!(tags, vec![GpioTag::Out { pin: 17, value: 1 }]);
    assert_eq!(bank.digital_read(17), 0);
}

#[test]
fn test_guest_shell_echo_is_harmless() {
    // The guest echoes the typed command before running it; only the output line is a tag.
    let mut bank = RegisterBank::new();
    let mut bridge = SerialBridge::new(100);
    let transcript = b"/ # gpio-mode 22 out\r\n[GPIO_MODE: 22 OUT]\r\n/ # gpio-write 22 1\r\n[GPIO_OUT: 22 1]\r\n/ # ";
    let tags = bridge.on_guest_output(&mut bank, transcript);
    assert_eq!(
        tags,
        vec![
            GpioTag::Mode { pin: 22, mode: PinMode::Out },
            GpioTag::Out { pin: 22, value: 1 },
        ]
    );
    assert_eq!(bank.digital_read(22), 1);
}

#[test]
fn test_injected_script_echo_is_not_a_tag() {
    // Typing the helper definitions echoes `\$1` placeholders, which never match.
    let mut tokenizer = TagTokenizer::default();
    let echoed: Vec<u8> = injection_bytes().collect();
    assert!(tokenizer.feed_all(&echoed).is_empty());
    assert_eq!(INJECTION_COMMANDS.len(), 10);
}

#[test]
fn test_invalid_pin_tag_is_ignored() {
    let mut bank = RegisterBank::new();
    let mut bridge = SerialBridge::new(100);
    bridge.on_guest_output(&mut bank, b"[GPIO_MODE: 99 out][GPIO_OUT: 99 1]");
    assert!(bank.all_pins().iter().all(|p| p.state.mode == PinMode::In));
}

fn noise() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>().prop_filter("no tag opener", |b| *b != b'['), 0..150)
}

proptest! {
    #[test]
    fn prop_chunking_does_not_change_tags(
        bytes in proptest::collection::vec(any::<u8>(), 0..400),
        cuts in proptest::collection::vec(any::<usize>(), 0..20),
    ) {
        let mut whole = TagTokenizer::default();
        let expected = whole.feed_all(&bytes);

        let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
        points.push(0);
        points.push(bytes.len());
        points.sort_unstable();

        let mut chunked = TagTokenizer::default();
        let mut got = Vec::new();
        for pair in points.windows(2) {
            got.extend(chunked.feed_all(&bytes[pair[0]..pair[1]]));
        }
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_tag_in_noise_is_found(
        before in noise(),
        after in noise(),
        pin in 0u8..28,
        value in 0u8..2,
    ) {
        let mut stream = before;
        stream.extend(format!("[GPIO_OUT: {} {}]", pin, value).bytes());
        stream.extend(after);

        let mut tokenizer = TagTokenizer::default();
        let tags = tokenizer.feed_all(&stream);
        prop_assert_eq!(tags, vec![GpioTag::Out { pin, value }]);
    }
}
