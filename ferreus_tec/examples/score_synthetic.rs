use ferreus_tec::{
    BatchParams, BatchRecord, ObservationData, ObservationMetadata, TecTestFunctions,
    progress::{ProgressMsg, closure_sink},
    score_batch,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Print batch events as they arrive
    let (sink, listener) = closure_sink(64, |msg| match msg {
        ProgressMsg::RecordSkipped { label, reason } => println!("{label}: skipped, {reason}"),
        ProgressMsg::RecordFailed { label, error } => println!("{label}: failed, {error}"),
        ProgressMsg::BatchProgress { completed, total, .. } => {
            println!("{completed}/{total} observations done")
        }
        _ => {}
    });
    let progress = Some(sink);

    // A quiet and an active synthetic night, plus one with too few sources
    let records: Vec<BatchRecord> = [
        (1065880128u64, TecTestFunctions::gaussian_blob_observation(1500, 10.0, Some(1))),
        (1065880248u64, TecTestFunctions::sidelobe_observation(1500, 300, Some(2))),
        (1065880368u64, TecTestFunctions::gaussian_blob_observation(200, 10.0, Some(3))),
    ]
    .into_iter()
    .map(|(obsid, obs)| {
        let data = ObservationData {
            ra: obs.ra().to_vec(),
            dec: obs.dec().to_vec(),
            ra_shifts: obs.ra_shifts().to_vec(),
            dec_shifts: obs.dec_shifts().to_vec(),
            metadata: Some(ObservationMetadata { obsid: Some(obsid) }),
        };
        BatchRecord::new(obs.label(), data)
    })
    .collect();

    let outcomes = score_batch(records, &BatchParams::default(), &progress)?;

    // Dropping the sink closes the channel so the listener thread can finish
    drop(progress);
    listener.join().map_err(|_| "progress listener panicked")?;

    for outcome in &outcomes {
        if let Some(metric) = outcome.metric() {
            println!("{}: metric {:.4}", metric.label, metric.value);
            for term in &metric.terms {
                println!("    {:<24} {:>12.6} x {}", term.name, term.statistic, term.weight);
            }
        }
    }

    Ok(())
}
