use std::env;
use std::time::SystemTime;

use anyhow::Result;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use chrono::{DateTime, Duration, TimeZone, Utc};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use log::{debug, warn};
use oscsign_core::{Context, ErrorKind, OsEnv, SignRequest};
use oscsign_http_send_reqwest::ReqwestHttpSend;
use oscsign_osc_v4::constants::CONTENT_TYPE_JSON;
use oscsign_osc_v4::{
    canonical_headers, sign, sign_descriptor, CallContext, CanonicalRequest, Client, Config,
    Credential, RequestDescriptor, RequestSigner, SigningScheme, Verifier,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

fn test_cred() -> Credential {
    Credential::new("AKIDEXAMPLE", "secret123")
}

fn signature_of(authorization: &str) -> &str {
    authorization
        .rsplit_once("Signature=")
        .map(|(_, sig)| sig)
        .expect("authorization must carry a signature")
}

#[test_case("eu-west-2", r#"{"DryRun":false}"#, "bd57e36a97d16fc7efda31ac53f87570087dde3223d2b6ce22fe5ff8674b7fe7"; "eu-west-2 dry run false")]
#[test_case("us-east-1", r#"{"DryRun":false}"#, "a6506b717f40397c2a4cb33d39e9d56e19c5085502932431324b4cb8db466dce"; "us-east-1 dry run false")]
#[test_case("eu-west-2", r#"{"DryRun":true}"#, "cdfc07ae898f9808dd857b16297c107d0d574e917c36ee2fd641ead9b2e19f22"; "eu-west-2 dry run true")]
#[test_case("us-east-1", r#"{"DryRun":true}"#, "7315dc8ee980c116d2dc7f78eb37d1f38e0730ae5612b424515e3e1463cd2944"; "us-east-1 dry run true")]
#[test_case("eu-west-2", "", "5adb567c06f79cb87536d1310c371aef8485824fe5045983351b31ebeb81f988"; "eu-west-2 empty payload")]
#[test_case("us-east-1", "", "2d43d981ed71b76e680b90ad0cfd8b84b78fb9cf9ccdaee1422532c8864c7cf4"; "us-east-1 empty payload")]
fn test_golden_signatures(region: &str, payload: &str, expected: &str) -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let headers = sign(
        &SigningScheme::OSC4,
        "ReadVms",
        payload.as_bytes(),
        "api",
        region,
        &test_cred(),
        test_time(),
    )?;

    assert_eq!(headers.signature, expected);
    assert_eq!(signature_of(&headers.authorization), expected);
    assert_eq!(headers.host, format!("api.{region}.outscale.com"));
    assert_eq!(
        headers.authorization,
        format!(
            "OSC4-HMAC-SHA256 Credential=AKIDEXAMPLE/20230101/{region}/api/osc4_request, SignedHeaders=content-type;host;x-osc-date, Signature={expected}"
        )
    );
    Ok(())
}

#[test]
fn test_sign_is_deterministic() -> Result<()> {
    let sign_once = || {
        sign(
            &SigningScheme::OSC4,
            "ReadVms",
            br#"{"DryRun":false}"#,
            "api",
            "eu-west-2",
            &test_cred(),
            test_time(),
        )
    };

    assert_eq!(sign_once()?, sign_once()?);
    Ok(())
}

#[test]
fn test_sign_changes_with_time() -> Result<()> {
    let signer = RequestSigner::new(CallContext::new("eu-west-2", "api", "latest"));

    let a = signer.sign_with_time("ReadVms", br#"{"DryRun":false}"#, &test_cred(), test_time())?;
    let b = signer.sign_with_time(
        "ReadVms",
        br#"{"DryRun":false}"#,
        &test_cred(),
        test_time() + Duration::seconds(1),
    )?;

    assert_eq!(b.date, "20230101T000001Z");
    assert_eq!(
        b.signature,
        "bd947e0bccabd879d6edd3aeeb9856555c40d080ae47ef9a2e08fecb10238a0e"
    );
    assert_ne!(a.signature, b.signature);
    Ok(())
}

#[test]
fn test_sign_changes_with_payload() -> Result<()> {
    let signer = RequestSigner::new(CallContext::new("eu-west-2", "api", "latest"));

    let a = signer.sign_with_time("ReadVms", br#"{"DryRun":false}"#, &test_cred(), test_time())?;
    let b = signer.sign_with_time("ReadVms", br#"{"DryRun":true}"#, &test_cred(), test_time())?;

    assert_ne!(a.signature, b.signature);
    assert_eq!(a.signature.len(), 64);
    assert_eq!(b.signature.len(), 64);
    Ok(())
}

#[test]
fn test_header_order_does_not_matter() -> Result<()> {
    let forward = canonical_headers([
        ("Content-Type", CONTENT_TYPE_JSON),
        ("Host", "api.eu-west-2.outscale.com"),
        ("X-Osc-Date", "20230101T000000Z"),
    ])?;
    let backward = canonical_headers([
        ("x-osc-date", "20230101T000000Z"),
        ("host", "api.eu-west-2.outscale.com"),
        ("content-type", CONTENT_TYPE_JSON),
    ])?;
    assert_eq!(forward, backward);

    let descriptor = |headers: &[(&str, &str)]| {
        headers.iter().fold(
            RequestDescriptor::new("api.eu-west-2.outscale.com", "/api/latest/ReadVms", "{}"),
            |d, (k, v)| d.with_header(*k, *v),
        )
    };
    let a = sign_descriptor(
        &SigningScheme::OSC4,
        &descriptor(&[("x-extra-a", "1"), ("X-Extra-B", "2")]),
        "eu-west-2",
        "api",
        &test_cred(),
        test_time(),
    )?;
    let b = sign_descriptor(
        &SigningScheme::OSC4,
        &descriptor(&[("X-Extra-B", "2"), ("x-extra-a", "1")]),
        "eu-west-2",
        "api",
        &test_cred(),
        test_time(),
    )?;
    assert_eq!(a, b);
    assert_eq!(
        a.signed_headers,
        "content-type;host;x-extra-a;x-extra-b;x-osc-date"
    );
    Ok(())
}

#[test]
fn test_aws4_published_example() -> Result<()> {
    let creq = CanonicalRequest::build(
        "GET",
        "/",
        "Action=ListUsers&Version=2010-05-08",
        [
            (
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            ),
            ("Host", "iam.amazonaws.com"),
            ("X-Amz-Date", "20150830T123600Z"),
        ],
        b"",
    )?;
    assert_eq!(
        creq.hash(),
        "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
    );

    let mut descriptor = RequestDescriptor::new("iam.amazonaws.com", "/", "")
        .with_query("Action=ListUsers&Version=2010-05-08")
        .with_header(
            "Content-Type",
            "application/x-www-form-urlencoded; charset=utf-8",
        );
    descriptor.method = "GET".to_string();

    let headers = sign_descriptor(
        &SigningScheme::AWS4,
        &descriptor,
        "us-east-1",
        "iam",
        &Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap(),
    )?;
    assert_eq!(
        headers.signature,
        "5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
    );
    Ok(())
}

/// Sign the same request with `aws-sigv4` and with the AWS4 scheme.
#[test_case("eu-west-2", "ReadVms", r#"{"DryRun":false}"#; "read vms")]
#[test_case("us-east-1", "ReadRegions", "{}"; "read regions")]
#[test_case("eu-west-2", "CreateTags", r#"{"ResourceIds":["i-0000"],"Tags":[{"Key":"a b","Value":"é"}]}"#; "create tags")]
#[test_case("eu-west-2", "ReadVms", ""; "empty payload")]
fn test_compare_with_aws_sigv4(region: &str, action: &str, payload: &str) -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let now = Utc::now();
    let call = CallContext::new(region, "api", "latest");
    let url = call.endpoint("outscale.com", action)?;

    let id = Credentials::new(
        "access_key_id",
        "secret_access_key",
        None,
        None,
        "hardcoded-credentials",
    )
    .into();
    let sp = v4::SigningParams::builder()
        .identity(&id)
        .region(region)
        .name("api")
        .time(SystemTime::from(now))
        .settings(SigningSettings::default())
        .build()
        .expect("signing params must be valid");

    let mut expected_req = http::Request::post(&url)
        .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
        .body(payload)?;
    let output = aws_sigv4::http_request::sign(
        SignableRequest::new(
            "POST",
            url.clone(),
            [(CONTENT_TYPE.as_str(), CONTENT_TYPE_JSON)].into_iter(),
            SignableBody::Bytes(payload.as_bytes()),
        )?,
        &sp.into(),
    )?;
    let (aws_sig, _) = output.into_parts();
    aws_sig.apply_to_request_http1x(&mut expected_req);

    let (mut parts, _) = http::Request::post(&url)
        .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
        .body(())?
        .into_parts();
    RequestSigner::new(call)
        .with_scheme(SigningScheme::AWS4)
        .with_time(now)
        .sign_request(
            &mut parts,
            payload.as_bytes(),
            Some(&Credential::new("access_key_id", "secret_access_key")),
        )?;

    let expected = expected_req.headers()[AUTHORIZATION].to_str()?;
    let actual = parts.headers[AUTHORIZATION].to_str()?;
    debug!("aws-sigv4: {expected}");
    debug!("oscsign: {actual}");
    assert_eq!(signature_of(expected), signature_of(actual));
    assert_eq!(expected, actual);
    Ok(())
}

#[test]
fn test_signed_request_verifies() -> Result<()> {
    let call = CallContext::new("eu-west-2", "api", "latest");
    let headers = RequestSigner::new(call.clone()).sign_with_time(
        "ReadVms",
        br#"{"DryRun":false}"#,
        &test_cred(),
        test_time(),
    )?;

    let req = headers.iter().fold(
        RequestDescriptor::new(
            call.host("outscale.com"),
            call.path("ReadVms")?,
            r#"{"DryRun":false}"#,
        ),
        |d, (k, v)| d.with_header(k, v),
    );

    let verifier = Verifier::new(SigningScheme::OSC4).with_max_skew(Duration::minutes(15));
    verifier.verify(&req, &test_cred(), test_time())?;

    let err = verifier
        .verify(&req, &test_cred(), test_time() + Duration::hours(1))
        .expect_err("request must be too old");
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    Ok(())
}

#[test]
fn test_sign_concurrently_across_regions() -> Result<()> {
    let expected = [
        (
            "eu-west-2",
            "bd57e36a97d16fc7efda31ac53f87570087dde3223d2b6ce22fe5ff8674b7fe7",
        ),
        (
            "us-east-1",
            "a6506b717f40397c2a4cb33d39e9d56e19c5085502932431324b4cb8db466dce",
        ),
    ];

    let handles = (0..16)
        .map(|i| {
            let (region, sig) = expected[i % 2];
            std::thread::spawn(move || {
                let headers = RequestSigner::new(CallContext::new(region, "api", "latest"))
                    .sign_with_time("ReadVms", br#"{"DryRun":false}"#, &test_cred(), test_time())
                    .expect("sign must succeed");
                assert_eq!(headers.signature, sig);
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().expect("thread must not panic");
    }
    Ok(())
}

/// Calls the real API when `OSCSIGN_OSC_V4_TEST=on`.
///
/// Credentials and region are read from `OSC_ACCESS_KEY`, `OSC_SECRET_KEY`
/// and `OSC_REGION`.
#[tokio::test]
async fn test_read_regions_online() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    if env::var("OSCSIGN_OSC_V4_TEST").unwrap_or_default() != "on" {
        warn!("OSCSIGN_OSC_V4_TEST is not set, skipped");
        return Ok(());
    }

    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::from_env(&ctx);
    let client = Client::new(ctx, config)?;

    let regions = client.read_regions(false).await?;
    debug!("got regions: {regions:?}");
    assert!(!regions.is_empty());
    Ok(())
}
