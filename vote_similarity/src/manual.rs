/*!

This is the long-form manual for `vote_similarity` and `bsim`.

## Ballot tables

A ballot table has one row per politician and per poll. The following columns are
required, under either of the names listed:

| column          | also accepted       |
|-----------------|---------------------|
| `party`         | `Fraktion/Gruppe`   |
| `politician_id` | `Bezeichnung`       |
| `poll_date`     | `date`              |
| `poll_title`    | `title`             |
| `outcome`       | `vote`              |

The outcome is one of `yes`, `no`, `abstain`, `invalid`, `no_show` (or the labels of
the Bundestag sheets: `ja`, `nein`, `Enthaltung`, `ungültig`, `nichtabgegeben`).
Any other value rejects the whole table: dropping the row would change the
denominator of the party distribution it belongs to. Such errors name the
record, counted from 1 without the header: record 2 of a CSV file is on its
third line.

**Each politician must appear at most once per poll.** This is not checked.

## Input formats

### `csv`

A CSV file with a header row naming the columns above.

### `json`

A JSON array of flat objects, with the column names as keys.

### `xlsx`

A roll-call sheet as published by the Bundestag: one sheet per poll, a header
row with `Fraktion/Gruppe`, `Bezeichnung` and one column per outcome (`ja`,
`nein`, `Enthaltung`, `ungültig`, `nichtabgegeben`) holding a 1 for the outcome
of the row. Rows with zero or several outcomes reject the sheet. The date and
the title of the poll are not part of the sheet: they are given in the
configuration (`pollDate`, `pollTitle`).

## Configuration

```json
{
  "outputSettings": { "analysisName": "20th Bundestag", "includeRows": false },
  "ballotSources": [
    { "provider": "csv", "filePath": "votes.csv" },
    { "provider": "xlsx", "filePath": "20220202_1.xlsx",
      "pollDate": "2022-02-02", "pollTitle": "Impfpflicht" }
  ],
  "partyAliases": { "DIE LINKE": "DIE LINKE." },
  "analysis": { "politician": "Anna Muster", "party": "SPD", "proponents": true }
}
```

File paths are relative to the configuration file. When `partyAliases` is
missing, the spellings of the Bundestag sheets are unified.

## Outputs

The summary contains, for the politician (against every party) and for the
party (against every other party):

- `summary`: count, mean, standard deviation, min, quartiles and max of the
  similarity against each party, by increasing mean;
- `overTime`: the mean similarity against each party per year;
- `rows`: every scored poll, when `includeRows` is set. The outcome columns
  carry the suffixes of the comparison (`yes`, `yes_party` for a politician,
  `yes_a`, `yes_b` for two parties).

The `proponents` list gives, for each poll, the party with the largest share of
yes votes. Ties go to the party whose name comes first alphabetically.

## Similarity

The similarity of two outcome vectors is their cosine: 1 when both sides split
their votes in the same proportions, 0 when they have no outcome in common. The
vectors have no negative entries, so the value never leaves [0, 1]. A side
without any ballot has a zero vector: the similarity is then set to 0 and a
warning is logged.
*/
