#![no_main]
use cea708::decode::{DecodeOptions, Decoder, StreamDecoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size; the rest is the caption stream.
    let Some((&step, stream)) = data.split_first() else {
        return;
    };
    let step = usize::from(step).max(1);
    let decoder = Decoder::with_options(DecodeOptions::LENIENT);

    let whole = decoder.decode_to_string(stream);

    let mut sd = StreamDecoder::new(decoder);
    let mut out = String::new();
    let chunked = stream
        .chunks(step)
        .try_for_each(|chunk| sd.feed(chunk, &mut out).map(drop))
        .and_then(|()| sd.finish());

    match (whole, chunked) {
        (Ok((text, stats)), Ok(chunk_stats)) => {
            assert_eq!(text, out);
            assert_eq!(stats, chunk_stats);
        }
        (Err(a), Err(b)) => assert_eq!(a.offset(), b.offset()),
        (a, b) => panic!("whole {a:?} vs chunked {b:?}"),
    }
});
