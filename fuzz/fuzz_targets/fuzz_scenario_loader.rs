#![no_main]

use libfuzzer_sys::fuzz_target;
use osce_station::scenario::ScenarioLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        let _ = ScenarioLoader::with_defaults().load_from_str(yaml, "<fuzz>");
    }
});
