//! Pre-alert composition and dispatch.
//!
//! Every station gets the same six-line flight summary; the remark block
//! underneath differs. Liège and Budapest quote the delivery channel and
//! the warehouse tally, Athens quotes its hub note as the channel, and
//! Belgrade and Bucharest send the bare summary. Subject lines follow
//! the handlers' inbox filters, so their shapes are load-bearing down to
//! the spacing.

use std::path::{Path, PathBuf};

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use prefile_config::{Recipients, Smtp};
use prefile_engine::numeric::format_number;
use prefile_engine::{Station, WaybillRecord};

use crate::CliError;

const UPDATE_PREFIX: &str = "(update)";

pub(crate) struct Prealert {
    pub subject: String,
    pub body: String,
}

/// Compose the subject and plain-text body for one waybill.
///
/// `sorting_info` is the register's sorting cell as it stands after the
/// pipeline ran, so a tally written moments ago is already included.
pub(crate) fn compose(
    station: Station,
    record: &WaybillRecord,
    sorting_info: &str,
    update: bool,
) -> Prealert {
    let update = if update { UPDATE_PREFIX } else { "" };
    let eta = record.eta_text();

    let subject = match station {
        Station::Lgg => format!(
            "{update}CC AND OP INSTRUCTIONS_B2C_YDH_{awb} ETA {eta}【CT】",
            awb = record.awb,
        ),
        Station::Beg => format!(
            "{update}YDH-PRE ALERT - AWB#{awb} ETA {eta}",
            awb = record.awb,
        ),
        Station::Ath | Station::Sob | Station::Otp => format!(
            "{update}YDH-{code} new shipment_ AWB :{awb} ETA {eta}",
            code = station.code(),
            awb = record.awb,
        ),
    };

    Prealert {
        subject,
        body: body_text(station, record, sorting_info, &eta),
    }
}

fn body_text(station: Station, record: &WaybillRecord, sorting_info: &str, eta: &str) -> String {
    let core = format!(
        "Dear,\n\
         Please find here enclosed the document, the customs clearance and operations instructions for below container/awb:\n\
         1. Flight Detail：{flight} ( {dep} - {arr} )\n\
         2. ETD ：{etd} (Local time)\n\
         3. ETA ：{eta} (Local time)\n\
         4. MAWB： {awb}\n\
         5. Total Bags   {boxes}  PCS (   {parcels} PARCELS)\n\
         6. Total Weight :   {weight} KG\n",
        flight = record.flight_number,
        dep = record.departure_port,
        arr = record.arrival_station,
        etd = record.etd_text(),
        eta = eta,
        awb = record.awb,
        boxes = record.boxes,
        parcels = record.parcels,
        weight = format_number(record.billable_weight),
    );

    match station {
        Station::Lgg | Station::Sob => format!(
            "{core}Remark :\nDelivery Channel : {channel}\n{sorting}",
            channel = record.airtable_code,
            sorting = sorting_info,
        ),
        Station::Ath => format!("{core}Remark :\nDelivery Channel : {sorting_info}"),
        Station::Beg | Station::Otp => core,
    }
}

/// `LGG_Prealert<user@host>` as a mailbox.
fn sender(station: Station, smtp: &Smtp) -> Result<Mailbox, CliError> {
    let raw = format!(
        "{code}{suffix}<{user}>",
        code = station.code(),
        suffix = smtp.from_label_suffix,
        user = smtp.username,
    );
    raw.parse()
        .map_err(|e| CliError::mail(format!("invalid sender address {:?}: {}", raw, e)))
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, CliError> {
    raw.parse()
        .map_err(|e| CliError::mail(format!("invalid recipient {:?}: {}", raw, e)))
}

fn attachment(path: &Path) -> Result<SinglePart, CliError> {
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => ContentType::parse("application/pdf").unwrap(),
        Some("xlsx") => ContentType::parse(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .unwrap(),
        _ => ContentType::parse("application/octet-stream").unwrap(),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    let bytes = std::fs::read(path).map_err(|e| {
        CliError::mail(format!("cannot read attachment {}: {}", path.display(), e))
    })?;
    Ok(Attachment::new(name).body(bytes, content_type))
}

/// Send the pre-alert over implicit-TLS SMTP with the given attachments.
pub(crate) fn send(
    station: Station,
    prealert: &Prealert,
    attachments: &[PathBuf],
    recipients: &Recipients,
    smtp: &Smtp,
    password: &str,
) -> Result<(), CliError> {
    let mut builder = Message::builder()
        .from(sender(station, smtp)?)
        .subject(prealert.subject.clone());
    for to in &recipients.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    for cc in &recipients.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(prealert.body.clone()));
    for path in attachments {
        parts = parts.singlepart(attachment(path)?);
    }

    let message = builder
        .multipart(parts)
        .map_err(|e| CliError::mail(format!("cannot assemble message: {}", e)))?;

    let mailer = SmtpTransport::relay(&smtp.host)
        .map_err(|e| CliError::mail(format!("cannot configure SMTP for {}: {}", smtp.host, e)))?
        .port(smtp.port)
        .credentials(Credentials::new(
            smtp.username.clone(),
            password.to_string(),
        ))
        .build();

    mailer
        .send(&message)
        .map_err(|e| CliError::mail(format!("send failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WaybillRecord {
        WaybillRecord {
            awb: "160-12345675".into(),
            flight_number: "CV7964".into(),
            departure_port: "HKG".into(),
            arrival_station: "LGG".into(),
            etd_serial: "45000.5".into(),
            eta_serial: "45001.25".into(),
            boxes: "412".into(),
            route_code: "LGGATP-MIX".into(),
            parcels: "9800".into(),
            billable_weight: 18000.0,
            download_url: "https://example.com/doc.pdf".into(),
            airtable_code: "AT Post Kalsdorf TEMU".into(),
            sorting_info: String::new(),
            register_row: 2,
        }
    }

    #[test]
    fn lgg_prealert_full_shape() {
        let tally = "LGG WH1 : 200;LGG WH2 : 212";
        let mail = compose(Station::Lgg, &record(), tally, true);
        assert_eq!(
            mail.subject,
            "(update)CC AND OP INSTRUCTIONS_B2C_YDH_160-12345675 ETA 2023-03-16 06:00:00【CT】"
        );
        assert_eq!(
            mail.body,
            "Dear,\n\
             Please find here enclosed the document, the customs clearance and operations instructions for below container/awb:\n\
             1. Flight Detail：CV7964 ( HKG - LGG )\n\
             2. ETD ：2023-03-15 12:00:00 (Local time)\n\
             3. ETA ：2023-03-16 06:00:00 (Local time)\n\
             4. MAWB： 160-12345675\n\
             5. Total Bags   412  PCS (   9800 PARCELS)\n\
             6. Total Weight :   18000 KG\n\
             Remark :\n\
             Delivery Channel : AT Post Kalsdorf TEMU\n\
             LGG WH1 : 200;LGG WH2 : 212"
        );
    }

    #[test]
    fn ath_channel_is_the_hub_note() {
        let mut rec = record();
        rec.arrival_station = "ATH".into();
        let note = "ACS  hub:Athens 36-38 Petrou Ralli Post code 12241 Athens";
        let mail = compose(Station::Ath, &rec, note, false);
        assert_eq!(
            mail.subject,
            "YDH-ATH new shipment_ AWB :160-12345675 ETA 2023-03-16 06:00:00"
        );
        assert!(mail.body.ends_with(&format!("Delivery Channel : {note}")));
        assert!(!mail.body.contains("AT Post Kalsdorf TEMU"));
    }

    #[test]
    fn beg_body_is_the_bare_summary() {
        let mut rec = record();
        rec.arrival_station = "BEG".into();
        let mail = compose(Station::Beg, &rec, "", false);
        assert_eq!(
            mail.subject,
            "YDH-PRE ALERT - AWB#160-12345675 ETA 2023-03-16 06:00:00"
        );
        assert!(!mail.body.contains("Remark"));
        assert!(mail.body.ends_with("6. Total Weight :   18000 KG\n"));
    }

    #[test]
    fn update_prefix_is_opt_in() {
        let mail = compose(Station::Otp, &record(), "", false);
        assert!(mail.subject.starts_with("YDH-OTP"));
        let mail = compose(Station::Otp, &record(), "", true);
        assert!(mail.subject.starts_with("(update)YDH-OTP"));
    }

    #[test]
    fn sender_label_carries_the_station() {
        let smtp = Smtp {
            username: "prealert@example.com".into(),
            ..Smtp::default()
        };
        let from = sender(Station::Sob, &smtp).unwrap();
        assert_eq!(from.name.as_deref(), Some("SOB_Prealert"));
        assert_eq!(from.email.to_string(), "prealert@example.com");
    }

    #[test]
    fn attachment_type_follows_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("160-12345675.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        assert!(attachment(&pdf).is_ok());

        let missing = dir.path().join("never-written.xlsx");
        let err = attachment(&missing).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_MAIL);
    }
}
