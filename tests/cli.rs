use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::process::Command;

const BINARY: &str = "readtidy";
type TestResult = Result<(), Box<dyn std::error::Error>>;

const DUPLICATES: &str = "\
@read1 lane=1
ACGTACGT
+read1 lane=1
IIIIIIII
@read2
TTTTGGGG
+
IIII####
@read3
ACGTACGT
+
55555555
";

#[test]
fn file_doesnt_exist() -> TestResult {
    let temp = TempDir::new()?;
    let out = temp.child("out.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .arg("dedup")
        .arg("file_which_does_not_exist.fastq")
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("file_which_does_not_exist.fastq"));

    // nothing is created when an input cannot be opened
    out.assert(predicate::path::missing());
    stats.assert(predicate::path::missing());
    Ok(())
}

#[test]
fn dedup_keeps_last_occurrence() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;
    let out = temp.child("out.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .arg("dedup")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Out of: 3 sequences, removed: 1."));

    out.assert("@read3\nACGTACGT\n+\n55555555\n@read2\nTTTTGGGG\n+\nIIII####\n");
    stats.assert("Total_Sequences\tUnique_Sequences\tPercent_Unique\n3\t2\t66.67\n");
    Ok(())
}

#[test]
fn qc_filters_and_normalizes_separator() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;
    let out = temp.child("out.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .args(["qc", "-q", "30", "-p", "0.6"])
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .success();

    out.assert("@read1 lane=1\nACGTACGT\n+\nIIIIIIII\n");
    stats.assert(
        "Total_Sequences\tSequences_Passing_Filter\tPercent_Passing_Filter\n3\t1\t33.33\n",
    );
    Ok(())
}

#[test]
fn invalid_proportion_exits_with_one() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;

    Command::cargo_bin(BINARY)?
        .args(["qc", "--min-proportion", "1.5"])
        .arg(input.path())
        .arg("-o")
        .arg(temp.child("out.fastq").path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be a number within [0, 1]"));

    temp.child("out.fastq").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn reconcile_reports_percent_of_both_files() -> TestResult {
    let temp = TempDir::new()?;
    let first = temp.child("r1.fastq");
    let second = temp.child("r2.fastq");
    first.write_str("@A\nAAAA\n+\nIIII\n@B\nCCCC\n+\nIIII\n@C\nGGGG\n+\nIIII\n")?;
    second.write_str("@A\nTTTT\n+\nIIII\n@C\nGGCC\n+\nIIII\n@D\nTTAA\n+\nIIII\n")?;
    let out1 = temp.child("o1.fastq");
    let out2 = temp.child("o2.fastq");
    let stats = temp.child("stats.tsv");
    let summary = temp.child("summary.json");

    Command::cargo_bin(BINARY)?
        .arg("reconcile")
        .arg(first.path())
        .arg(second.path())
        .arg("--out1")
        .arg(out1.path())
        .arg("--out2")
        .arg(out2.path())
        .arg("-s")
        .arg(stats.path())
        .arg("--summary-json")
        .arg(summary.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Percent paired sequences: 33.33%"));

    out1.assert("@A\nAAAA\n+\nIIII\n@C\nGGGG\n+\nIIII\n");
    out2.assert("@A\nTTTT\n+\nIIII\n@C\nGGCC\n+\nIIII\n");
    stats.assert("Total_Sequences\tPaired_Sequences\tPercent_Paired\n6\t2\t33.33\n");
    summary.assert(predicate::str::contains("\"kind\": \"reconcile\""));
    Ok(())
}

#[test]
fn empty_input_reports_zero_percent() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("empty.fastq");
    input.touch()?;
    let out = temp.child("out.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .arg("qc")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .success();

    out.assert("");
    stats.assert("Total_Sequences\tSequences_Passing_Filter\tPercent_Passing_Filter\n0\t0\t0\n");
    Ok(())
}

#[test]
fn truncated_record_fails_after_flushing() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str("@a\nACGT\n+\nIIII\n@b\nACGT\n+\n")?;
    let out = temp.child("out.fastq");

    Command::cargo_bin(BINARY)?
        .arg("qc")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(temp.child("stats.tsv").path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("truncated record"))
        .stderr(predicate::str::contains("parse error"));

    out.assert("@a\nACGT\n+\nIIII\n");
    Ok(())
}

#[test]
fn per_read_stats() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str("@r1\nGGCA\n+\nIIII\n")?;
    let out = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .args(["stats", "--mean", "simple"])
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    out.assert("Name\tLength\tGC.Content\tAverage.Quality\n@r1\t4\t75\t40\n");
    Ok(())
}

const MATES_1: &str = "\
@p1/1
AAAAAAAA
+
IIIIIIII
@p2/1
CCCCCCCC
+
IIIIIIII
@p3/1
AAAAAAAA
+
IIIIIIII
";

const MATES_2: &str = "\
@p1/2
TTTTTTTT
+
IIIIIIII
@p2/2
GGGGGGGG
+
########
@p3/2
TTTTTTTT
+
55555555
";

#[test]
fn dedup_paired_keeps_mates_in_step() -> TestResult {
    let temp = TempDir::new()?;
    let first = temp.child("r1.fastq");
    let second = temp.child("r2.fastq");
    first.write_str(MATES_1)?;
    second.write_str(MATES_2)?;
    let out1 = temp.child("o1.fastq");
    let out2 = temp.child("o2.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .arg("dedup-paired")
        .arg(first.path())
        .arg(second.path())
        .arg("--out1")
        .arg(out1.path())
        .arg("--out2")
        .arg(out2.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .success();

    // keys AAAAAAAA}{TTTTTTTT (p3 replaces p1) and CCCCCCCC}{GGGGGGGG
    out1.assert("@p3/1\nAAAAAAAA\n+\nIIIIIIII\n@p2/1\nCCCCCCCC\n+\nIIIIIIII\n");
    out2.assert("@p3/2\nTTTTTTTT\n+\n55555555\n@p2/2\nGGGGGGGG\n+\n########\n");
    stats.assert("Total_Sequences\tUnique_Sequences\tPercent_Unique\n3\t2\t66.67\n");
    Ok(())
}

#[test]
fn qc_paired_drops_both_mates_together() -> TestResult {
    let temp = TempDir::new()?;
    let first = temp.child("r1.fastq");
    let second = temp.child("r2.fastq");
    first.write_str(MATES_1)?;
    second.write_str(MATES_2)?;
    let out1 = temp.child("o1.fastq");
    let out2 = temp.child("o2.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .args(["qc-paired", "-q", "20", "-p", "1"])
        .arg(first.path())
        .arg(second.path())
        .arg("--out1")
        .arg(out1.path())
        .arg("--out2")
        .arg(out2.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .success();

    out1.assert("@p1/1\nAAAAAAAA\n+\nIIIIIIII\n@p3/1\nAAAAAAAA\n+\nIIIIIIII\n");
    out2.assert("@p1/2\nTTTTTTTT\n+\nIIIIIIII\n@p3/2\nTTTTTTTT\n+\n55555555\n");
    stats.assert(
        "Total_Sequences\tSequences_Passing_Filter\tPercent_Passing_Filter\n3\t2\t66.67\n",
    );
    Ok(())
}

#[test]
fn unopenable_summary_leaves_no_output() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;
    let out = temp.child("out.fastq");
    let stats = temp.child("stats.tsv");

    Command::cargo_bin(BINARY)?
        .arg("--summary-json")
        .arg(temp.child("no_such_dir/summary.json").path())
        .arg("dedup")
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg(stats.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("file error"));

    out.assert(predicate::path::missing());
    stats.assert(predicate::path::missing());
    Ok(())
}

#[test]
fn summary_is_removed_when_outputs_cannot_be_created() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;
    let summary = temp.child("summary.json");

    Command::cargo_bin(BINARY)?
        .arg("--summary-json")
        .arg(summary.path())
        .arg("dedup")
        .arg(input.path())
        .arg("-o")
        .arg(temp.child("no_such_dir/out.fastq").path())
        .arg("-s")
        .arg(temp.child("stats.tsv").path())
        .assert()
        .code(1);

    summary.assert(predicate::path::missing());
    temp.child("stats.tsv").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn summary_records_run_parameters() -> TestResult {
    let temp = TempDir::new()?;
    let input = temp.child("in.fastq");
    input.write_str(DUPLICATES)?;
    let summary = temp.child("summary.json");

    Command::cargo_bin(BINARY)?
        .arg("--summary-json")
        .arg(summary.path())
        .args(["qc", "-q", "30", "-p", "0.6", "--reject-ambiguous"])
        .arg(input.path())
        .arg("-o")
        .arg(temp.child("out.fastq").path())
        .arg("-s")
        .arg(temp.child("stats.tsv").path())
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(summary.path())?)?;
    assert_eq!(json["command"], "qc");
    assert_eq!(json["parameters"]["separator"], "normalize");
    assert_eq!(json["parameters"]["scoring"]["phred_offset"], 33);
    assert_eq!(json["parameters"]["scoring"]["mean"], "probabilistic");
    assert_eq!(json["parameters"]["filter"]["min_quality"], 30);
    assert_eq!(json["parameters"]["filter"]["min_proportion"], 0.6);
    assert_eq!(json["parameters"]["filter"]["reject_ambiguous"], true);
    assert_eq!(json["summary"]["kind"], "quality_control");
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["kept"], 1);
    Ok(())
}
