include!("./lib/util.rs");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_bad_messages() {
        let handle = init();

        send_raw("this is not json");
        send(json!(["1", "sync:everything", {"credentials": creds("Admin123")}]));
        send(json!(["2", "sync:forms", {}]));
        send(json!(["3", "sync:download-patients", {"credentials": creds("Admin123")}]));
        send(json!(["4", "sync:download-patients", {"credentials": creds("Admin123"), "patient_uuids": ["p1", "p2"]}]));

        // the bad ones never made it to the worker
        let ev = wait_on("sync:status");
        assert_eq!(get_str(&["kind"], &ev), "download_patient_only");
        assert_eq!(get_str(&["message"], &ev), "Downloaded 2 new patients");
        assert_eq!(get_str(&["step"], &wait_on("sync:status")), "observations");
        assert_eq!(get_str(&["step"], &wait_on("sync:status")), "encounters");

        let leftover = end(handle);
        let statuses = leftover.iter()
            .filter(|ev| get_str(&["e"], ev) == "sync:status")
            .count();
        assert_eq!(statuses, 0);
    }
}
