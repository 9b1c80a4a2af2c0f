//! Encode a record, then decode it from input split across two buffers

use chrono::Utc;
use tinyhand_io::{ByteSequence, ExtensionTypeCode, MessagePackReader, MessagePackWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Tinyhand IO Example");
    println!("===================\n");

    // Encode {"name": "sensor-7", "readings": [21, -4, 1013], "at": <timestamp>, "id": ext 99}
    let mut writer = MessagePackWriter::new();
    writer.write_map_header(4);
    writer.write_str("name");
    writer.write_str("sensor-7");
    writer.write_str("readings");
    writer.write_array_header(3);
    for reading in [21, -4, 1013] {
        writer.write_i32(reading);
    }
    writer.write_str("at");
    writer.write_datetime(&Utc::now());
    writer.write_str("id");
    writer.write_extension(ExtensionTypeCode::IDENTIFIER, b"en-US");
    let encoded = writer.flush();
    println!("Encoded to {} bytes: {:02x?}", encoded.len(), encoded.as_ref());

    // Pretend the transport delivered the bytes in two reads
    let (head, tail) = encoded.split_at(encoded.len() / 2);
    let mut reader = MessagePackReader::new(ByteSequence::from_segments([head, tail]));

    let fields = reader.read_map_header()?;
    for _ in 0..fields {
        let key = reader.read_string()?.unwrap_or_default();
        match &*key {
            "name" => println!("name     = {:?}", reader.read_string()?),
            "readings" => {
                let count = reader.read_array_header()?;
                let readings = (0..count)
                    .map(|_| reader.read_i32())
                    .collect::<Result<Vec<_>, _>>()?;
                println!("readings = {readings:?}");
            }
            "at" => println!("at       = {}", reader.read_datetime()?),
            "id" => {
                let ext = reader.read_extension_format()?;
                let text = String::from_utf8(ext.data().to_vec())?;
                println!("id       = ext {} {text:?}", ext.type_code());
            }
            _ => reader.skip()?,
        }
    }

    assert!(reader.is_end());
    println!("\n✅ Decoded every field");

    Ok(())
}
