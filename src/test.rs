#[cfg(test)]
mod tests {
    use crate::error::codes;
    use crate::{Class, Options, Record, Stats, ZoneError, parse_file, parse_string};

    /// An owned copy of one emission.
    #[derive(Debug, PartialEq, Eq)]
    struct Rec {
        owner: Vec<u8>,
        rtype: u16,
        class: u16,
        ttl: u32,
        rdata: Vec<u8>,
    }

    fn options(origin: &str, ttl: u32) -> Options {
        Options::new(origin, ttl, Class::In).unwrap()
    }

    fn collect(options: &Options, input: &[u8]) -> (Result<Stats, ZoneError>, Vec<Rec>) {
        let mut got = Vec::new();
        let result = parse_string(options, input, &mut |record: &Record<'_>| -> Result<usize, i32> {
            got.push(Rec {
                owner: record.owner.as_bytes().to_vec(),
                rtype: record.rtype,
                class: record.class,
                ttl: record.ttl,
                rdata: record.rdata.to_vec(),
            });
            Ok(0)
        });
        (result, got)
    }

    fn rdata_of(options: &Options, line: &[u8]) -> Vec<u8> {
        let (result, recs) = collect(options, line);
        result.unwrap();
        assert_eq!(recs.len(), 1, "expected one record from {:?}", String::from_utf8_lossy(line));
        recs.into_iter().next().unwrap().rdata
    }

    #[test]
    fn a_record_in_full() {
        let opts = options("example.com.", 3600);
        let (result, recs) = collect(&opts, b"example.com. 3600 IN A 192.0.2.1\n");
        result.unwrap();
        assert_eq!(
            recs,
            vec![Rec {
                owner: b"\x07example\x03com\x00".to_vec(),
                rtype: 1,
                class: 1,
                ttl: 3600,
                rdata: vec![0xC0, 0x00, 0x02, 0x01],
            }]
        );
    }

    #[test]
    fn soa_across_parentheses_then_inheritance() {
        let opts = options("example.", 60);
        let (result, recs) =
            collect(&opts, b"@ IN SOA ns. hostmaster. (\n  1 2 3 4 5 )\nwww A 192.0.2.2\n");
        result.unwrap();
        assert_eq!(recs.len(), 2);

        let soa = &recs[0];
        assert_eq!(soa.owner, b"\x07example\x00");
        assert_eq!(soa.rtype, 6);
        assert_eq!(soa.ttl, 60);
        // ns. + hostmaster. + five 32-bit fields
        let mut expected = b"\x02ns\x00\x0ahostmaster\x00".to_vec();
        for value in [1u32, 2, 3, 4, 5] {
            expected.extend_from_slice(&value.to_be_bytes());
        }
        assert_eq!(soa.rdata, expected);

        let a = &recs[1];
        assert_eq!(a.owner, b"\x03www\x07example\x00");
        assert_eq!(a.rtype, 1);
        assert_eq!(a.ttl, 60, "TTL inherits the default");
        assert_eq!(a.class, 1, "class inherits from the SOA line");
    }

    #[test]
    fn unterminated_quote_fails_after_earlier_records() {
        let opts = options("example.com.", 300);
        let (result, recs) = collect(&opts, b"a A 192.0.2.1\nb TXT \"oops\n");
        assert_eq!(result.unwrap_err().code(), codes::SYNTAX_ERROR);
        assert_eq!(recs.len(), 1, "the A record was already delivered");
    }

    #[test]
    fn generic_rdata_type65535() {
        let opts = options("example.com.", 300);
        let (result, recs) = collect(&opts, b"x TYPE65535 \\# 4 AABBCCDD\n");
        result.unwrap();
        assert_eq!(recs[0].rtype, 65535);
        assert_eq!(recs[0].rdata, vec![0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn generic_rdata_works_for_known_types_too() {
        let opts = options("example.com.", 300);
        let direct = rdata_of(&opts, b"x A 192.0.2.1\n");
        let generic = rdata_of(&opts, b"x A \\# 4 C0000201\n");
        assert_eq!(direct, generic);
    }

    #[test]
    fn generic_rdata_length_must_match() {
        let opts = options("example.com.", 300);
        let (result, recs) = collect(&opts, b"x TYPE300 \\# 3 AABB\nok A 192.0.2.1\n");
        // recoverable: the bad record is skipped, the next one lands
        result.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].rtype, 1);
    }

    #[test]
    fn sink_abort_stops_the_parse() {
        let opts = options("example.com.", 300);
        let mut seen = 0u32;
        let result = parse_string(
            &opts,
            b"a A 192.0.2.1\nb A 192.0.2.2\nc A 192.0.2.3\nd A 192.0.2.4\n",
            &mut |_: &Record<'_>| -> Result<usize, i32> {
                seen += 1;
                if seen == 3 { Err(-1) } else { Ok(0) }
            },
        );
        match result.unwrap_err() {
            ZoneError::SinkAbort(code) => assert_eq!(code, -1),
            other => panic!("expected SinkAbort, got {other:?}"),
        }
        assert_eq!(seen, 3, "no records delivered past the abort");
    }

    #[test]
    fn sink_index_out_of_range_is_a_parameter_error() {
        let opts = options("example.com.", 300);
        let result =
            parse_string(&opts, b"a A 192.0.2.1\n", &mut |_: &Record<'_>| -> Result<usize, i32> {
                Ok(7)
            });
        assert_eq!(result.unwrap_err().code(), codes::BAD_PARAMETER);
    }

    #[test]
    fn ring_rotation_accepts_every_slot() {
        let opts = options("example.com.", 300).with_cache_size(3);
        let mut slot = 0usize;
        let result = parse_string(
            &opts,
            b"a A 192.0.2.1\nb A 192.0.2.2\nc A 192.0.2.3\nd A 192.0.2.4\n",
            &mut |_: &Record<'_>| -> Result<usize, i32> {
                slot = (slot + 1) % 3;
                Ok(slot)
            },
        );
        assert_eq!(result.unwrap().records, 4);
    }

    #[test]
    fn owner_ttl_class_defaulting_chain() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(
            &opts,
            b"a 300 CH A 192.0.2.1\n  A 192.0.2.2\nb A 192.0.2.3\n",
        );
        result.unwrap();
        assert_eq!(recs.len(), 3);
        // indented record inherits owner, ttl and class
        assert_eq!(recs[1].owner, recs[0].owner);
        assert_eq!(recs[1].ttl, 300);
        assert_eq!(recs[1].class, 3);
        // the named record keeps inheriting ttl and class
        assert_eq!(recs[2].owner, b"\x01b\x07example\x03com\x00");
        assert_eq!(recs[2].ttl, 300);
        assert_eq!(recs[2].class, 3);
    }

    #[test]
    fn ttl_and_class_reorder_freely() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"a IN 300 A 192.0.2.1\nb 300 IN A 192.0.2.2\n");
        result.unwrap();
        assert_eq!(recs[0].ttl, 300);
        assert_eq!(recs[0].class, 1);
        assert_eq!(recs[1].ttl, 300);
    }

    #[test]
    fn ttl_units_are_understood() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"a 1h30m A 192.0.2.1\n");
        result.unwrap();
        assert_eq!(recs[0].ttl, 5400);
    }

    #[test]
    fn indented_first_record_is_an_error() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"  A 192.0.2.1\n");
        assert_eq!(result.unwrap_err().code(), codes::SYNTAX_ERROR);
        assert!(recs.is_empty());
    }

    #[test]
    fn dollar_origin_and_ttl_rewrite_the_defaults() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(
            &opts,
            b"$ORIGIN sub.example.com.\n$TTL 900\nwww A 192.0.2.1\n",
        );
        result.unwrap();
        assert_eq!(recs[0].owner, b"\x03www\x03sub\x07example\x03com\x00");
        assert_eq!(recs[0].ttl, 900);
    }

    #[test]
    fn explicit_ttl_outranks_the_dollar_ttl() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"$TTL 900\na 30 A 192.0.2.1\nb A 192.0.2.2\n");
        result.unwrap();
        assert_eq!(recs[0].ttl, 30);
        assert_eq!(recs[1].ttl, 30, "the last explicit TTL carries forward");
    }

    #[test]
    fn generate_is_reserved_but_unimplemented() {
        let opts = options("example.com.", 120);
        let (result, _) = collect(&opts, b"$GENERATE 1-8 host-$ A 192.0.2.$\n");
        assert_eq!(result.unwrap_err().code(), codes::NOT_IMPLEMENTED);
    }

    #[test]
    fn typed_form_for_generic_only_types_is_skipped() {
        let opts = options("example.com.", 120);
        // LOC has no typed encoder; the typed spelling is skipped like any
        // bad record, the generic form still lands
        let (result, recs) = collect(
            &opts,
            b"a LOC 31 0 0 N 100 0 0 W 10m\nb A 192.0.2.1\nc LOC \\# 4 00112233\n",
        );
        result.unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].rtype, 1);
        assert_eq!(recs[0].owner, b"\x01b\x07example\x03com\x00");
        assert_eq!(recs[1].rtype, 29);
        assert_eq!(recs[1].rdata, vec![0x00, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn unknown_directive_is_fatal() {
        let opts = options("example.com.", 120);
        let (result, _) = collect(&opts, b"$BOGUS whatever\n");
        assert_eq!(result.unwrap_err().code(), codes::SYNTAX_ERROR);
    }

    #[test]
    fn semantic_errors_skip_the_record_and_continue() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(
            &opts,
            b"bad A 999.0.2.1\ngood A 192.0.2.1\nworse MX not-a-number mail\nlast A 192.0.2.9\n",
        );
        result.unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].owner, b"\x04good\x07example\x03com\x00");
        assert_eq!(recs[1].owner, b"\x04last\x07example\x03com\x00");
    }

    #[test]
    fn comments_and_blank_lines_are_invisible() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(
            &opts,
            b"; a full-line comment\n\n   \na A 192.0.2.1 ; trailing comment\n",
        );
        result.unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn crlf_line_endings_parse() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"a A 192.0.2.1\r\nb A 192.0.2.2\r\n");
        result.unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn mx_txt_srv_wire_shapes() {
        let opts = options("example.com.", 120);
        assert_eq!(
            rdata_of(&opts, b"@ MX 10 mail\n"),
            b"\x00\x0a\x04mail\x07example\x03com\x00"
        );
        assert_eq!(
            rdata_of(&opts, b"@ TXT \"hello world\" second\n"),
            b"\x0bhello world\x06second"
        );
        assert_eq!(
            rdata_of(&opts, b"@ SRV 1 2 443 target.\n"),
            b"\x00\x01\x00\x02\x01\xbb\x06target\x00"
        );
    }

    #[test]
    fn caa_and_uri_wire_shapes() {
        let opts = options("example.com.", 120);
        assert_eq!(
            rdata_of(&opts, b"@ CAA 0 issue \"ca.example.net\"\n"),
            b"\x00\x05issueca.example.net"
        );
        let uri = rdata_of(&opts, b"@ URI 10 1 \"https://example.com/\"\n");
        assert_eq!(&uri[..4], [0, 10, 0, 1]);
        assert_eq!(&uri[4..], b"https://example.com/");
    }

    #[test]
    fn nsec3_wire_shape() {
        let opts = options("example.com.", 120);
        let rdata = rdata_of(
            &opts,
            b"@ NSEC3 1 0 12 AABBCCDD CPNMUOJ1 A NS SOA\n",
        );
        assert_eq!(&rdata[..5], [1, 0, 0, 12, 4]);
        assert_eq!(&rdata[5..9], [0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(rdata[9], 5, "hash length prefix");
        // bitmap window 0 with A, NS and SOA set
        let bitmap = &rdata[9 + 1 + 5..];
        assert_eq!(bitmap[0], 0);
        assert_eq!(bitmap[1], 1);
        assert_eq!(bitmap[2], 0b0110_0010);
    }

    #[test]
    fn svcb_params_sort_on_the_wire() {
        let opts = options("example.com.", 120);
        let rdata = rdata_of(&opts, b"@ HTTPS 1 . port=443 alpn=h2,h3\n");
        // priority 1, root target, then alpn (key 1) before port (key 3)
        assert_eq!(&rdata[..3], [0, 1, 0]);
        assert_eq!(&rdata[3..7], [0, 1, 0, 6]);
        assert_eq!(&rdata[7..13], b"\x02h2\x02h3");
        assert_eq!(&rdata[13..19], [0, 3, 0, 2, 1, 187]);
    }

    #[test]
    fn escaped_owner_labels_survive() {
        let opts = options("example.com.", 120);
        let (result, recs) = collect(&opts, b"odd\\.label A 192.0.2.1\n");
        result.unwrap();
        assert_eq!(recs[0].owner, b"\x09odd.label\x07example\x03com\x00");
    }

    #[test]
    fn stats_count_records_and_files() {
        let opts = options("example.com.", 120);
        let (result, _) = collect(&opts, b"a A 192.0.2.1\nb A 192.0.2.2\n");
        let stats = result.unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.files, 1);
        assert!(stats.lines >= 2);
    }

    // ---- file-backed scenarios ----

    struct TempZone {
        dir: std::path::PathBuf,
    }

    impl TempZone {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("zff-test-{tag}-{}", std::process::id()));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).expect("failed to create test directory");
            Self { dir }
        }

        fn write(&self, name: &str, contents: &[u8]) -> std::path::PathBuf {
            let path = self.dir.join(name);
            std::fs::write(&path, contents).expect("failed to write test zone");
            path
        }
    }

    impl Drop for TempZone {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn collect_file(
        options: &Options,
        path: &std::path::Path,
    ) -> (Result<Stats, ZoneError>, Vec<Rec>) {
        let mut got = Vec::new();
        let result = parse_file(options, path, &mut |record: &Record<'_>| -> Result<usize, i32> {
            got.push(Rec {
                owner: record.owner.as_bytes().to_vec(),
                rtype: record.rtype,
                class: record.class,
                ttl: record.ttl,
                rdata: record.rdata.to_vec(),
            });
            Ok(0)
        });
        (result, got)
    }

    #[test]
    fn include_interleaves_and_restores_defaults() {
        let zone = TempZone::new("include");
        zone.write("sub.zone", b"a A 192.0.2.3\n");
        let main = zone.write(
            "main.zone",
            b"first A 192.0.2.1\n$INCLUDE sub.zone\n  A 192.0.2.4\n",
        );
        let opts = options("example.com.", 300);
        let (result, recs) = collect_file(&opts, &main);
        result.unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1].owner, b"\x01a\x07example\x03com\x00");
        // the indented record after the include still owns to `first`:
        // the includer's defaults survived the nested frame
        assert_eq!(recs[2].owner, b"\x05first\x07example\x03com\x00");
    }

    #[test]
    fn include_with_its_own_origin() {
        let zone = TempZone::new("include-origin");
        zone.write("sub.zone", b"a A 192.0.2.3\n");
        let main = zone.write("main.zone", b"$INCLUDE sub.zone sub.example.com.\n");
        let opts = options("example.com.", 300);
        let (result, recs) = collect_file(&opts, &main);
        result.unwrap();
        assert_eq!(recs[0].owner, b"\x01a\x03sub\x07example\x03com\x00");
    }

    #[test]
    fn include_cycles_are_fatal() {
        let zone = TempZone::new("cycle");
        let self_path = zone.dir.join("loop.zone");
        zone.write("loop.zone", b"$INCLUDE loop.zone\n");
        let opts = options("example.com.", 300);
        let (result, _) = collect_file(&opts, &self_path);
        assert_eq!(result.unwrap_err().code(), codes::SEMANTIC_ERROR);
    }

    #[test]
    fn missing_include_is_an_io_error() {
        let zone = TempZone::new("missing");
        let main = zone.write("main.zone", b"$INCLUDE nowhere.zone\n");
        let opts = options("example.com.", 300);
        let (result, _) = collect_file(&opts, &main);
        assert_eq!(result.unwrap_err().code(), codes::IO_ERROR);
    }

    #[test]
    fn missing_zone_file_is_an_io_error() {
        let opts = options("example.com.", 300);
        let (result, _) = collect_file(&opts, std::path::Path::new("/nonexistent/zff.zone"));
        assert_eq!(result.unwrap_err().code(), codes::IO_ERROR);
    }

    // ---- cross-variant determinism ----

    #[test]
    fn all_available_variants_deliver_identical_records() {
        use crate::indexer::{TARGET_ENV, Variant};

        let input: Vec<u8> = {
            let mut zone = Vec::new();
            zone.extend_from_slice(b"$TTL 1h\n");
            for i in 0..200 {
                zone.extend_from_slice(
                    format!("host-{i} A 192.0.2.{}\n", i % 250).as_bytes(),
                );
                if i % 7 == 0 {
                    zone.extend_from_slice(b"  TXT \"padding ; text ( with ) noise\"\n");
                }
            }
            zone
        };
        let opts = options("example.com.", 300);

        let mut baseline: Option<Vec<Rec>> = None;
        for variant in Variant::ALL {
            if !variant.available() {
                continue;
            }
            // SAFETY: tests in this binary tolerate the race, every variant
            // must produce identical output anyway
            unsafe { std::env::set_var(TARGET_ENV, variant.name()) };
            let (result, recs) = collect(&opts, &input);
            result.unwrap();
            match &baseline {
                None => baseline = Some(recs),
                Some(expect) => assert_eq!(
                    &recs,
                    expect,
                    "variant {} diverged from the baseline",
                    variant.name()
                ),
            }
        }
        // SAFETY: as above
        unsafe { std::env::remove_var(TARGET_ENV) };
    }
}
