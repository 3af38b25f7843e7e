#![no_main]

use libfuzzer_sys::fuzz_target;
use objtape::io::TapeWriter;
use objtape::ObjectFile;

fuzz_target!(|data: &[u8]| {
    let mut file = ObjectFile::new("fuzz");
    if file.read(data).is_ok() {
        let mut writer = TapeWriter::new(Vec::<u8>::new());
        file.write(&mut writer).unwrap();
    }
});
