// src/bridge/injection.rs - Shell helpers typed into the guest after it boots
//
// Each helper only echoes a GPIO tag, so any guest program calling them produces output
// the tag tokenizer recognizes. Lines are meant for a POSIX shell on the guest console.

/// Commands typed into the guest, in order.
pub const INJECTION_COMMANDS: [&str; 10] = [
    r##"echo "#!/bin/sh" > /usr/bin/gpio-mode"##,
    r##"echo "echo \"[GPIO_MODE: \$1 \$2]\"" >> /usr/bin/gpio-mode"##,
    "chmod +x /usr/bin/gpio-mode",
    r##"echo "#!/bin/sh" > /usr/bin/gpio-write"##,
    r##"echo "echo \"[GPIO_OUT: \$1 \$2]\"" >> /usr/bin/gpio-write"##,
    "chmod +x /usr/bin/gpio-write",
    r##"echo "#!/bin/sh" > /usr/bin/gpio-blink"##,
    r##"echo "while [ \$2 -gt 0 ]; do gpio-write \$1 1; sleep 0.5; gpio-write \$1 0; sleep 0.5; num=\$(( \$2 - 1 )); set -- \$1 \$num; done" >> /usr/bin/gpio-blink"##,
    "chmod +x /usr/bin/gpio-blink",
    "clear",
];

/// The byte stream sent to the guest: every command followed by `\n`.
pub fn injection_bytes() -> impl Iterator<Item = u8> {
    INJECTION_COMMANDS
        .iter()
        .flat_map(|cmd| cmd.bytes().chain(std::iter::once(b'\n')))
}
