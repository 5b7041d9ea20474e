#![no_main]
use chainpack::{encode, Cursor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut skipper = Cursor::new(data);
    let skipped = skipper.skip().map(|_| skipper.position());
    let mut reader = Cursor::new(data);
    if let Ok(v) = reader.read_generic() {
        // Skipping and decoding must agree on where the value ends
        assert_eq!(skipped, Ok(reader.position()));
        let enc = encode(&v).expect("decoded values re-encode");
        assert_eq!(Cursor::new(&enc).read_generic(), Ok(v));
    }
});
